//! Declarative helpers for the per-vendor status and attribute enumerations.

/// Declares a vendor status enum: code, name and taxonomy class per entry.
macro_rules! status_catalog {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident = $code:literal => $class:ident, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $name {
            $( $variant = $code, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$( $name::$variant, )+];

            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $( $code => Some($name::$variant), )+
                    _ => None,
                }
            }

            pub fn code(self) -> i32 {
                self as i32
            }

            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant), )+
                }
            }

            pub fn class(self) -> $crate::status::StatusClass {
                match self {
                    $( $name::$variant => $crate::status::StatusClass::$class, )+
                }
            }

            /// Catalog lookup in the shape `VendorSpec` expects.
            pub(crate) fn lookup(
                code: i32,
            ) -> Option<(&'static str, $crate::status::StatusClass)> {
                Self::from_code(code).map(|s| (s.name(), s.class()))
            }
        }
    };
}

/// Declares a vendor device-attribute enum with its numeric identities.
macro_rules! attribute_catalog {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident = $code:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $name {
            $( $variant = $code, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$( $name::$variant, )+];

            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $( $code => Some($name::$variant), )+
                    _ => None,
                }
            }

            pub fn code(self) -> i32 {
                self as i32
            }

            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant), )+
                }
            }
        }
    };
}

pub(crate) use attribute_catalog;
pub(crate) use status_catalog;
