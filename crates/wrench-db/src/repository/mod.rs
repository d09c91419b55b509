//! # Repository Module
//!
//! Database repository implementations for Wrench POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler / InvoiceService                                         │
//! │       │                                                                 │
//! │       │  db.items().search("brake", 10)                                │
//! │       ▼                                                                 │
//! │  ItemRepository                                                        │
//! │  ├── search(&self, query, limit)                                       │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, item)                                               │
//! │  └── set_quantity(&self, id, quantity)                                 │
//! │       │                                                                 │
//! │       │  SQL Query (runtime-checked, bound parameters)                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CustomerRepository`] - Customer find-or-create, listing and search
//! - [`ItemRepository`] - Catalog CRUD, search and stock deltas
//! - [`InvoiceRepository`] - Invoice + line item persistence and search
//! - [`SettingsRepository`] - Shop settings singleton
//! - [`CounterRepository`] - Per-period invoice number counters
//!
//! [`CustomerRepository`]: customer::CustomerRepository
//! [`ItemRepository`]: item::ItemRepository
//! [`InvoiceRepository`]: invoice::InvoiceRepository
//! [`SettingsRepository`]: settings::SettingsRepository
//! [`CounterRepository`]: counter::CounterRepository

pub mod counter;
pub mod customer;
pub mod invoice;
pub mod item;
pub mod settings;

/// Lowercases text for the `*_folded` search columns.
///
/// SQLite only folds ASCII, so names are folded here on write and queries on
/// read.
pub(crate) fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Builds a `LIKE` pattern matching the case-folded `query` anywhere, with
/// `%`, `_` and `\` escaped. Use together with `ESCAPE '\'` against a
/// `*_folded` column.
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in fold_case(query).chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("reyes"), "%reyes%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_contains_pattern_folds_non_ascii() {
        assert_eq!(contains_pattern("ÉMILE"), "%émile%");
        assert_eq!(fold_case("Émile Müller"), "émile müller");
    }
}
