//! Table naming convention for persisted models

/// Table name for a persisted model type.
///
/// Defaults to the lowercased type name; set [`TableName::TABLE_NAME`] to
/// override it.
///
/// ```
/// use wu_core::database::TableName;
///
/// struct UserProfile;
/// impl TableName for UserProfile {}
///
/// struct Order;
/// impl TableName for Order {
///     const TABLE_NAME: Option<&'static str> = Some("orders");
/// }
///
/// assert_eq!(UserProfile::table_name(), "userprofile");
/// assert_eq!(Order::table_name(), "orders");
/// ```
pub trait TableName {
    const TABLE_NAME: Option<&'static str> = None;

    fn table_name() -> String {
        match Self::TABLE_NAME {
            Some(name) => name.to_owned(),
            None => default_table_name::<Self>(),
        }
    }
}

/// Lowercased final path segment of `T`'s name, without generic arguments
pub fn default_table_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .to_lowercase()
}
