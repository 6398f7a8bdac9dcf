//! Convenience macros for building registrations in code and fixtures.

/// Builds a [`RegistrationRow`](crate::registration::RegistrationRow).
///
/// # Example
/// ```rust,ignore
/// let row = registration_row!(
///     kind: "invoice",
///     order: 10,
///     constructor: "field_rules.defaults",
///     data: r#"{"status":"draft"}"#
/// );
/// ```
#[macro_export]
macro_rules! registration_row {
    (
        kind: $kind:expr,
        order: $order:expr,
        constructor: $constructor:expr
        $(, data: $data:expr)?
        $(, phases: [$($phase:expr),* $(,)?])?
        $(,)?
    ) => {{
        #[allow(unused_mut)]
        let mut row = $crate::registration::RegistrationRow::new($kind, $order, $constructor);
        $(
            row.additional_data = Some($data.to_string());
        )?
        $(
            row.phases = Some(vec![$($crate::context::OperationKind::as_str(&$phase).to_string()),*]);
        )?
        row
    }};
}
