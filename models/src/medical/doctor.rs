// models/src/medical/doctor.rs

use serde::{Deserialize, Serialize};

/// A registered doctor. The ledger key is the licensing number with a `d`
/// prefix, assigned at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub doctor_id: String,
    pub doctor_name: String,
    pub bmdc_no: String,
}

impl Doctor {
    pub fn from_licence(bmdc_no: impl Into<String>, name: impl Into<String>) -> Self {
        let bmdc_no = bmdc_no.into();
        Doctor {
            doctor_id: format!("d{bmdc_no}"),
            doctor_name: name.into(),
            bmdc_no,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Doctor;

    #[test]
    fn doctor_id_is_prefixed_licence_number() {
        let doctor = Doctor::from_licence("0001", "Doctor1");
        assert_eq!(doctor.doctor_id, "d0001");
        assert_eq!(doctor.bmdc_no, "0001");
    }
}
