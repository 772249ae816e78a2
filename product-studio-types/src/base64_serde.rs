use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serializer};

/// 将原始字节写成 base64 字符串（`inlineData.data` 字段）。
pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&STANDARD.encode(bytes))
}

/// 读取 base64 字符串并解码为字节。
pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let encoded = String::deserialize(deserializer)?;
    STANDARD
        .decode(encoded.trim().as_bytes())
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "super")]
        data: Vec<u8>,
    }

    #[test]
    fn encodes_as_string_and_tolerates_whitespace() {
        let value = serde_json::to_value(Holder { data: b"png".to_vec() }).unwrap();
        assert_eq!(value["data"], "cG5n");

        let decoded: Holder = serde_json::from_str(r#"{"data":" cG5n\n"}"#).unwrap();
        assert_eq!(decoded.data, b"png");
    }

    #[test]
    fn rejects_invalid_base64() {
        let result = serde_json::from_str::<Holder>(r#"{"data":"***"}"#);
        assert!(result.is_err());
    }
}
