use crate::ffi::RawStatus;

/// Taxonomy every vendor status is sorted into.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// The call succeeded.
    Success,
    /// Library, driver or device missing, too old, or busy. Skip the vendor or device.
    Unavailable,
    /// The caller sequenced or parameterised a call wrongly.
    Misuse,
    /// The device is left inconsistent and every further call on it fails the same way.
    DeviceFault,
    /// Pending asynchronous work. The caller decides if and when to retry.
    Transient,
}

impl StatusClass {
    pub fn is_success(self) -> bool {
        matches!(self, StatusClass::Success)
    }
}

impl std::fmt::Display for StatusClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatusClass::Success => "success",
            StatusClass::Unavailable => "unavailable",
            StatusClass::Misuse => "misuse",
            StatusClass::DeviceFault => "device fault",
            StatusClass::Transient => "transient",
        };
        f.write_str(s)
    }
}

/// A vendor status together with its catalog name and taxonomy class.
#[derive(serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedStatus {
    pub vendor: &'static str,
    pub code: RawStatus,
    pub name: &'static str,
    pub class: StatusClass,
}

impl ClassifiedStatus {
    pub fn is_success(&self) -> bool {
        self.class.is_success()
    }
}

impl std::fmt::Display for ClassifiedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} status {} ({}, {})",
            self.vendor, self.code, self.name, self.class
        )
    }
}
