//! MutationDecoder - wire payload <-> MutationRecord

use contracts::{Action, IndexParamFormat, IndexParams, MutationRecord};

use crate::vector::{decode_vector, encode_vector};
use crate::{DecodeError, WireMessage};

/// Decoder bound to one index parameter format.
///
/// Pure: no I/O, no shared state. Cheap to copy into every loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutationDecoder {
    index_params: IndexParamFormat,
}

impl MutationDecoder {
    pub fn new(index_params: IndexParamFormat) -> Self {
        Self { index_params }
    }

    pub fn index_param_format(&self) -> IndexParamFormat {
        self.index_params
    }

    /// Decode one transport payload.
    ///
    /// # Errors
    /// - `Malformed` for non-JSON input or wrongly typed fields
    /// - `MissingAction` / `UnsupportedAction` for an absent or unknown action
    /// - `InvalidVectorHex` / `InvalidVectorPayload` for bad insert vectors
    /// - `IndexParamMismatch` for create-index in the wrong parameter field
    pub fn decode(&self, payload: &[u8]) -> Result<MutationRecord, DecodeError> {
        let wire: WireMessage =
            serde_json::from_slice(payload).map_err(|e| DecodeError::Malformed {
                message: e.to_string(),
            })?;
        self.decode_wire(wire)
    }

    /// Decode an already parsed wire message
    pub fn decode_wire(&self, wire: WireMessage) -> Result<MutationRecord, DecodeError> {
        let action_name = wire.action.ok_or(DecodeError::MissingAction)?;
        let action = Action::parse(&action_name).ok_or(DecodeError::UnsupportedAction {
            action: action_name,
        })?;

        let vector = match action {
            Action::Insert => match wire.vector.as_deref() {
                Some(hex_payload) => decode_vector(hex_payload)?,
                None => Vec::new(),
            },
            _ => Vec::new(),
        };

        let index_params = match action {
            Action::CreateIndex => Some(self.index_params(wire.n_list, wire.extra_params)?),
            _ => None,
        };

        Ok(MutationRecord {
            action,
            vector,
            collection_name: wire.collection_name.unwrap_or_default(),
            partition_tag: wire.partition_tag.unwrap_or_default(),
            id: wire.id.unwrap_or_default(),
            dimension: wire.dimension.unwrap_or_default(),
            index_file_size: wire.index_file_size.unwrap_or_default(),
            index_params,
            index_type: wire.index_type.unwrap_or_default(),
            metric_type: wire.metric_type.unwrap_or_default(),
        })
    }

    fn index_params(
        &self,
        n_list: Option<i64>,
        extra_params: Option<String>,
    ) -> Result<IndexParams, DecodeError> {
        match (self.index_params, n_list, extra_params) {
            (IndexParamFormat::NList, _, Some(_)) => Err(DecodeError::IndexParamMismatch {
                expected: "n_list",
                found: "extra_params",
            }),
            (IndexParamFormat::ExtraParams, Some(_), _) => Err(DecodeError::IndexParamMismatch {
                expected: "extra_params",
                found: "n_list",
            }),
            (IndexParamFormat::NList, Some(n), None) => Ok(IndexParams::NList(n)),
            (IndexParamFormat::ExtraParams, None, Some(s)) => Ok(IndexParams::Extra(s)),
            (format, _, _) => Ok(IndexParams::empty(format)),
        }
    }

    /// Encode a record back to its wire form
    pub fn encode_wire(record: &MutationRecord) -> WireMessage {
        let (n_list, extra_params) = match &record.index_params {
            Some(IndexParams::NList(n)) => (Some(*n), None),
            Some(IndexParams::Extra(s)) => (None, Some(s.clone())),
            None => (None, None),
        };

        WireMessage {
            action: Some(record.action.as_str().to_string()),
            vector: (record.action == Action::Insert).then(|| encode_vector(&record.vector)),
            collection_name: Some(record.collection_name.clone()),
            partition_tag: Some(record.partition_tag.clone()),
            n_list,
            extra_params,
            id: Some(record.id),
            dimension: Some(record.dimension),
            index_file_size: Some(record.index_file_size),
            index_type: Some(record.index_type),
            metric_type: Some(record.metric_type),
        }
    }

    /// Encode a record as a JSON payload
    pub fn encode(record: &MutationRecord) -> Result<Vec<u8>, DecodeError> {
        serde_json::to_vec(&Self::encode_wire(record)).map_err(|e| DecodeError::Malformed {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> MutationDecoder {
        MutationDecoder::default()
    }

    #[test]
    fn test_decode_insert() {
        let payload = br#"{"action":"insert","vector":"0000803f","collection_name":"c1","partition_tag":"p1","id":7}"#;
        let record = decoder().decode(payload).unwrap();
        assert_eq!(record.action, Action::Insert);
        assert_eq!(record.collection_name, "c1");
        assert_eq!(record.partition_tag, "p1");
        assert_eq!(record.id, 7);
        assert_eq!(record.vector, vec![1.0]);
    }

    #[test]
    fn test_insert_with_bad_vector_length() {
        let payload = br#"{"action":"insert","vector":"0000803f00","collection_name":"c1","id":1}"#;
        let err = decoder().decode(payload).unwrap_err();
        assert_eq!(err, DecodeError::InvalidVectorPayload { len: 5 });
    }

    #[test]
    fn test_non_insert_ignores_vector() {
        // Not a whole number of floats, and not even valid hex
        let payload = br#"{"action":"delete","vector":"abc","collection_name":"c1","partition_tag":"p1","id":3}"#;
        let record = decoder().decode(payload).unwrap();
        assert_eq!(record.action, Action::Delete);
        assert!(record.vector.is_empty());
        assert_eq!(record.id, 3);
    }

    #[test]
    fn test_missing_action() {
        let err = decoder().decode(br#"{"collection_name":"c1"}"#).unwrap_err();
        assert_eq!(err, DecodeError::MissingAction);
    }

    #[test]
    fn test_unknown_action() {
        let err = decoder().decode(br#"{"action":"unknown"}"#).unwrap_err();
        assert!(err.is_unsupported_action());
        assert_eq!(err.kind(), "unsupported_action");
    }

    #[test]
    fn test_malformed_payloads() {
        let payloads: [&[u8]; 3] = [b"not json", b"42", br#"{"action":"delete","id":"seven"}"#];
        for payload in payloads {
            let err = decoder().decode(payload).unwrap_err();
            assert!(matches!(err, DecodeError::Malformed { .. }), "{err:?}");
        }
    }

    #[test]
    fn test_drop_index_ignores_other_fields() {
        let payload = br#"{"action":"drop-index","collection_name":"c1","dimension":128,"n_list":4}"#;
        let record = decoder().decode(payload).unwrap();
        assert_eq!(record.action, Action::DropIndex);
        assert_eq!(record.collection_name, "c1");
        assert_eq!(record.index_params, None);
    }

    #[test]
    fn test_create_index_nlist() {
        let payload = br#"{"action":"create-index","collection_name":"c1","index_type":2,"n_list":1024}"#;
        let record = decoder().decode(payload).unwrap();
        assert_eq!(record.index_type, 2);
        assert_eq!(record.index_params, Some(IndexParams::NList(1024)));
    }

    #[test]
    fn test_create_index_extra_params() {
        let decoder = MutationDecoder::new(IndexParamFormat::ExtraParams);
        let payload =
            br#"{"action":"create-index","collection_name":"c1","extra_params":"{\"nlist\":16}"}"#;
        let record = decoder.decode(payload).unwrap();
        assert_eq!(
            record.index_params,
            Some(IndexParams::Extra("{\"nlist\":16}".into()))
        );
    }

    #[test]
    fn test_create_index_format_mismatch() {
        let payload = br#"{"action":"create-index","collection_name":"c1","extra_params":"{}"}"#;
        let err = decoder().decode(payload).unwrap_err();
        assert_eq!(
            err,
            DecodeError::IndexParamMismatch {
                expected: "n_list",
                found: "extra_params"
            }
        );

        let decoder = MutationDecoder::new(IndexParamFormat::ExtraParams);
        let payload = br#"{"action":"create-index","collection_name":"c1","n_list":8}"#;
        assert!(matches!(
            decoder.decode(payload),
            Err(DecodeError::IndexParamMismatch { .. })
        ));
    }

    #[test]
    fn test_create_index_without_params_uses_zero_value() {
        let payload = br#"{"action":"create-index","collection_name":"c1"}"#;
        let record = decoder().decode(payload).unwrap();
        assert_eq!(record.index_params, Some(IndexParams::NList(0)));
    }

    #[test]
    fn test_create_collection_fields() {
        let payload = br#"{"action":"create-collection","collection_name":"c1","dimension":128,"index_file_size":1024,"metric_type":1}"#;
        let record = decoder().decode(payload).unwrap();
        assert_eq!(record.dimension, 128);
        assert_eq!(record.index_file_size, 1024);
        assert_eq!(record.metric_type, 1);
    }

    #[test]
    fn test_reencode_is_lossless() {
        let payloads: [&[u8]; 4] = [
            br#"{"action":"insert","vector":"0000803f00000040","collection_name":"c1","partition_tag":"p1","id":9}"#,
            br#"{"action":"create-collection","collection_name":"c2","dimension":8,"index_file_size":64,"metric_type":2}"#,
            br#"{"action":"create-index","collection_name":"c3","index_type":3,"n_list":256}"#,
            br#"{"action":"drop-partition","collection_name":"c4","partition_tag":"p4"}"#,
        ];

        for payload in payloads {
            let record = decoder().decode(payload).unwrap();
            let encoded = MutationDecoder::encode(&record).unwrap();
            let again = decoder().decode(&encoded).unwrap();
            assert_eq!(record, again);
        }
    }

    #[test]
    fn test_encode_insert_vector_hex() {
        let record = MutationRecord::new(Action::Insert)
            .with_collection("c1")
            .with_vector(vec![1.0]);
        let wire = MutationDecoder::encode_wire(&record);
        assert_eq!(wire.vector.as_deref(), Some("0000803f"));

        let wire = MutationDecoder::encode_wire(&MutationRecord::new(Action::DropCollection));
        assert_eq!(wire.vector, None);
    }
}
