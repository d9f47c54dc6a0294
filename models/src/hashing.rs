// models/src/hashing.rs

use sha2::{Digest, Sha256};

/// SHA-256 digest rendered as lowercase hex.
pub fn sha256_hex(value: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value);
    hex::encode(hasher.finalize())
}

/// Deterministic patient identifier derived from the national-ID number.
/// The same NID always yields the same id, so lookups need no extra index.
pub fn nid_hash(nid_no: &str) -> String {
    sha256_hex(nid_no.as_bytes())
}

/// EHR identifier: hash of the content id salted with the creation
/// timestamp, so two records pointing at identical content stay distinct.
pub fn ehr_id(cid: &str, timestamp_millis: i64) -> String {
    sha256_hex(format!("{cid}{timestamp_millis}").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::{ehr_id, nid_hash};

    #[test]
    fn nid_hash_is_deterministic() {
        assert_eq!(nid_hash("5000000001"), nid_hash("5000000001"));
    }

    #[test]
    fn distinct_nids_hash_differently() {
        let samples = ["5000000001", "5000000002", "1", "", "5000000001 "];
        for a in samples {
            for b in samples {
                if a != b {
                    assert_ne!(nid_hash(a), nid_hash(b), "{a:?} vs {b:?}");
                }
            }
        }
    }

    #[test]
    fn ehr_id_depends_on_timestamp() {
        let cid = "bafybeibwzif";
        assert_ne!(ehr_id(cid, 1), ehr_id(cid, 2));
        assert_eq!(ehr_id(cid, 7), ehr_id(cid, 7));
    }
}
