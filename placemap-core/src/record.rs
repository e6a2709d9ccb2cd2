use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Numeric identifier of a placement record, unique within one map document.
///
/// Hash ids come straight from the vendor dumps; they are only meaningful
/// inside the document that declared them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashId(pub u64);

impl fmt::Display for HashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// A translation/scale/rotation vector, serialized as a 3-element sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vec3(pub [f32; 3]);

impl Vec3 {
    pub fn x(&self) -> f32 {
        self.0[0]
    }

    pub fn y(&self) -> f32 {
        self.0[1]
    }

    pub fn z(&self) -> f32 {
        self.0[2]
    }
}

/// Scale and rotation appear in the dumps either as a uniform scalar or as a
/// full vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarOrVec3 {
    Scalar(f32),
    Vector(Vec3),
}

/// Free-form parameter bag attached to a placement record.
///
/// Contents are interpreted by convention, never validated. Key order is
/// preserved so re-serialized documents stay close to the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterBag(pub IndexMap<String, Value>);

impl ParameterBag {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value of a parameter, if present and a string.
    pub fn str_of(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Integer value of a parameter, if present and numeric.
    pub fn int_of(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    /// Truthiness of a boolean-ish parameter: `true`, or any non-zero number.
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            _ => false,
        }
    }
}

/// One outgoing reference of a placement record.
///
/// `DestUnitHashId` must resolve within the same document. The full record is
/// retained on the link for downstream attribute derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    #[serde(rename = "DestUnitHashId")]
    pub dest_unit_hash_id: HashId,
    #[serde(rename = "DefinitionName")]
    pub definition_name: String,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// One placed object instance, as loaded from a map document.
///
/// Vendor fields not modeled here (`SRTHash`, `UniqueName`, `LinksToRail`, …)
/// are retained verbatim in `extra` so the serialized row reproduces the
/// input document. Rail references are data only, never graph edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRecord {
    #[serde(rename = "HashId")]
    pub hash_id: HashId,
    #[serde(rename = "UnitConfigName")]
    pub unit_config_name: String,
    #[serde(rename = "Translate")]
    pub translate: Vec3,
    #[serde(rename = "Scale", default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScalarOrVec3>,
    #[serde(rename = "Rotate", default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<ScalarOrVec3>,
    #[serde(rename = "!Parameters", default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ParameterBag>,
    #[serde(rename = "LinksToObj", default, skip_serializing_if = "Option::is_none")]
    pub links_to_obj: Option<Vec<LinkRecord>>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl PlacementRecord {
    pub fn params(&self) -> Option<&ParameterBag> {
        self.parameters.as_ref()
    }

    /// Outgoing references, empty when the record declares none.
    pub fn links(&self) -> &[LinkRecord] {
        self.links_to_obj.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_roundtrip_keeps_vendor_fields() {
        let raw = json!({
            "!Parameters": {"DropActor": "Item_Apple"},
            "HashId": 123456u64,
            "SRTHash": 789,
            "UnitConfigName": "TBox_Field_Wood",
            "UniqueName": "Box01",
            "Translate": [1.0, 2.0, 3.0],
            "LinksToObj": [
                {"DefinitionName": "BasicSig", "DestUnitHashId": 42u64, "SaveFlag": "X"}
            ]
        });

        let rec: PlacementRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(rec.hash_id, HashId(123456));
        assert_eq!(rec.unit_config_name, "TBox_Field_Wood");
        assert_eq!(rec.translate.z(), 3.0);
        assert_eq!(rec.links().len(), 1);
        assert_eq!(rec.links()[0].dest_unit_hash_id, HashId(42));
        assert_eq!(rec.links()[0].definition_name, "BasicSig");
        assert_eq!(rec.extra.get("SRTHash"), Some(&json!(789)));

        let back = serde_json::to_value(&rec).unwrap();
        assert_eq!(back.get("UniqueName"), Some(&json!("Box01")));
        assert_eq!(back.get("LinksToObj").unwrap()[0].get("SaveFlag"), Some(&json!("X")));
    }

    #[test]
    fn scalar_or_vec3_accepts_both_forms() {
        let s: ScalarOrVec3 = serde_json::from_value(json!(2.5)).unwrap();
        assert_eq!(s, ScalarOrVec3::Scalar(2.5));

        let v: ScalarOrVec3 = serde_json::from_value(json!([1.0, 1.0, 1.0])).unwrap();
        assert_eq!(v, ScalarOrVec3::Vector(Vec3([1.0, 1.0, 1.0])));
    }

    #[test]
    fn parameter_bag_flags() {
        let bag: ParameterBag = serde_json::from_value(json!({
            "IsHardModeActor": true,
            "IsIchigekiActor": false,
            "SharpWeaponJudgeType": 2,
            "LevelSensorMode": 0,
            "DropTable": "Enemy_Lizalfos",
        }))
        .unwrap();

        assert!(bag.flag("IsHardModeActor"));
        assert!(!bag.flag("IsIchigekiActor"));
        assert!(bag.flag("SharpWeaponJudgeType"));
        assert!(!bag.flag("LevelSensorMode"));
        assert!(!bag.flag("Missing"));
        assert_eq!(bag.int_of("SharpWeaponJudgeType"), Some(2));
        assert_eq!(bag.str_of("DropTable"), Some("Enemy_Lizalfos"));
    }
}
