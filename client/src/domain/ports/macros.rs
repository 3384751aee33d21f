//! Defines helper macros for generating port error enums.
//!
//! Each variant gets a snake_case constructor whose parameters accept
//! anything convertible into the field type, so adapters can write
//! `SessionStoreError::io(err.to_string())` instead of spelling out the
//! struct literal.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    define_port_error! {
        pub enum SampleTransferError {
            Unreachable { host: String } => "cannot reach {host}",
            Rejected { status: u16 } => "rejected with {status}",
            Partial { name: String, written: u64 } => "{name}: wrote {written} bytes",
            Cancelled => "cancelled",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = SampleTransferError::unreachable("127.0.0.1");
        assert_eq!(err.to_string(), "cannot reach 127.0.0.1");
    }

    #[test]
    fn constructors_preserve_non_string_types() {
        let err = SampleTransferError::rejected(404_u16);
        assert_eq!(err.to_string(), "rejected with 404");
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = SampleTransferError::partial("plan.pdf", 512_u64);
        assert_eq!(err.to_string(), "plan.pdf: wrote 512 bytes");
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(SampleTransferError::cancelled(), SampleTransferError::Cancelled);
    }
}
