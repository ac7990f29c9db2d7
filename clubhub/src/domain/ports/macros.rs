//! `define_port_error!`: error enums for port adapters.
//!
//! Each variant gets a snake_case constructor whose fields accept
//! `impl Into<T>` and an `is_<variant>` predicate, so callers never match on
//! adapter-specific shapes.

macro_rules! define_port_error {
    (@variant_fns $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Construct [`Self::", stringify!($variant), "`].")]
            pub const fn [<$variant:snake>]() -> Self {
                Self::$variant
            }

            #[doc = concat!("Whether this is [`Self::", stringify!($variant), "`].")]
            #[must_use]
            pub const fn [<is_ $variant:snake>](&self) -> bool {
                matches!(self, Self::$variant)
            }
        }
    };

    (@variant_fns $variant:ident { $($field:ident : $ty:ty),+ }) => {
        ::paste::paste! {
            #[doc = concat!("Construct [`Self::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),+) -> Self {
                Self::$variant { $($field: $field.into()),+ }
            }

            #[doc = concat!("Whether this is [`Self::", stringify!($variant), "`].")]
            #[must_use]
            pub const fn [<is_ $variant:snake>](&self) -> bool {
                matches!(self, Self::$variant { .. })
            }
        }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),+ $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( {
                    $(
                        #[doc = concat!("Failure detail `", stringify!($field), "`.")]
                        $field : $ty
                    ),+
                } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@variant_fns $variant $( { $($field : $ty),+ } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    define_port_error! {
        pub enum LedgerError {
            Closed => "ledger closed",
            Timeout { message: String } => "timed out: {message}",
            Refused { status: u16, message: String } => "refused with {status}: {message}",
        }
    }

    #[rstest]
    #[case(LedgerError::closed(), "ledger closed")]
    #[case(LedgerError::timeout("after 30s"), "timed out: after 30s")]
    #[case(LedgerError::refused(409_u16, "duplicate"), "refused with 409: duplicate")]
    fn constructors_render_messages(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    fn predicates_match_only_their_variant() {
        let error = LedgerError::refused(500_u16, "down");

        assert!(error.is_refused());
        assert!(!error.is_timeout());
        assert!(!error.is_closed());
        assert!(LedgerError::closed().is_closed());
    }
}
