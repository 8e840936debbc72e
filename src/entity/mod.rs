pub mod readings;
pub mod uplinks;

use sea_orm::DbErr;

/// Narrow a stored integer back to the width it was written from.
pub(crate) fn narrow<T: TryFrom<i64>>(column: &str, value: i64) -> Result<T, DbErr> {
    T::try_from(value).map_err(|_| DbErr::Custom(format!("{column} out of range: {value}")))
}
