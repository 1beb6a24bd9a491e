/// Database models for tripledger
///
/// Each model owns its CRUD queries as associated functions taking a
/// `&PgPool`. Every read and write that touches user-owned data takes
/// the acting user's id and re-derives ownership through the foreign
/// key chain (despesa -> destino -> viagem -> usuario); a bare row id
/// is never trusted on its own.
///
/// # Models
///
/// - `user`: user accounts (usuarios)
/// - `trip`: trips (viagens), the top-level budget container
/// - `destination`: cities visited within a trip (destinos)
/// - `category`: user-defined expense categories (categorias_despesa)
/// - `payment_method`: user-defined payment methods (meios_pagamento)
/// - `expense`: dated expenses under a destination (despesas)
/// - `report`: filtered aggregation queries over despesas

pub mod category;
pub mod destination;
pub mod expense;
pub mod payment_method;
pub mod report;
pub mod trip;
pub mod user;

/// Deserializer distinguishing an absent JSON field from an explicit null
///
/// With `#[serde(default, deserialize_with = "double_option")]` on an
/// `Option<Option<T>>` field: absent => `None`, `null` => `Some(None)`,
/// a value => `Some(Some(v))`. Update structs use this to implement
/// "absent fields untouched, explicit null clears".
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
