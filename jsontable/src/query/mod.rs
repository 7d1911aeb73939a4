//! Read-only lookups over a table's rows.

mod filter;

pub use filter::{FilterCriterion, Pattern, CONTAINS, END_BY, EXACT, START_BY};

use crate::adapter::PersistenceAdapter;
use crate::document::row_id;
use crate::error::{JsonTableError, Result};
use crate::schema::normalize_name;
use crate::store::Store;
use crate::value::Row;

impl<A: PersistenceAdapter> Store<A> {
    /// Every row of a table, in storage order.
    pub fn find_all(&self, table_name: &str) -> Result<Vec<Row>> {
        Ok(self.get_table(table_name)?.rows().to_vec())
    }

    /// The row with this `ID`. Fails with `InvalidArgument` when none matches.
    pub fn find_one(&self, table_name: &str, id: i64) -> Result<Vec<Row>> {
        let rows: Vec<Row> = self
            .find_all(table_name)?
            .into_iter()
            .filter(|row| row_id(row) == Some(id))
            .collect();

        if rows.is_empty() {
            return Err(JsonTableError::InvalidArgument(format!(
                "No row with ID {id} in '{}'",
                normalize_name(table_name)
            )));
        }
        Ok(rows)
    }

    /// Rows matching every criterion, in storage order.
    ///
    /// Each criterion is a column name and a criterion string such as
    /// `"Baker"`, `"An|START_BY"` or `"er|END_BY"`. An empty result is not
    /// an error.
    pub fn find_one_by<I, K, V>(
        &self,
        table_name: &str,
        criteria: I,
        case_sensitive: bool,
    ) -> Result<Vec<Row>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let criteria = criteria
            .into_iter()
            .map(|(column, raw)| FilterCriterion::parse(column.as_ref(), raw.as_ref(), case_sensitive))
            .collect::<Result<Vec<_>>>()?;
        self.find_matching(table_name, &criteria)
    }

    /// Rows matching every pre-parsed criterion, in storage order.
    pub fn find_matching(&self, table_name: &str, criteria: &[FilterCriterion]) -> Result<Vec<Row>> {
        if criteria.is_empty() {
            return Err(JsonTableError::InvalidArgument(
                "At least one criterion is required".into(),
            ));
        }

        let table = self.get_table(table_name)?;
        if let Some(unknown) = criteria.iter().find(|c| !table.has_column(c.column())) {
            return Err(JsonTableError::InvalidKey(format!(
                "Column '{}' does not exist in '{}'",
                unknown.column(),
                normalize_name(table_name)
            )));
        }

        let mut rows = table.rows().to_vec();
        for criterion in criteria {
            rows.retain(|row| criterion.matches(row));
        }

        log::debug!(
            "{} rows of {} matched {} criteria",
            rows.len(),
            normalize_name(table_name),
            criteria.len()
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemoryAdapter;
    use crate::error::ErrorKind;
    use crate::schema::TableSchema;
    use crate::validation::RowBatch;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn person_store(people: &[(&str, &str)]) -> Store<MemoryAdapter> {
        let store = Store::in_memory();
        let schema =
            TableSchema::build("person", [("first_name", "string"), ("last_name", "string")])
                .unwrap();
        store.create_table(&schema).unwrap();

        let rows = people
            .iter()
            .map(|(first, last)| {
                Row::from([
                    ("first_name".to_string(), Value::from(*first)),
                    ("last_name".to_string(), Value::from(*last)),
                ])
            })
            .collect();
        store
            .insert(RowBatch::new(&store, "person", rows).unwrap())
            .unwrap();
        store
    }

    fn first_names(rows: &[Row]) -> Vec<&str> {
        rows.iter()
            .map(|row| row["FIRST_NAME"].as_str().unwrap())
            .collect()
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter().map(|row| row_id(row).unwrap()).collect()
    }

    const PEOPLE: &[(&str, &str)] = &[
        ("Andrea", "Baker"),
        ("Angela", "Carr"),
        ("Stephanie", "Dowd"),
        ("Vanessa", "Baker"),
        ("Adrian", "baker"),
        ("Julian", "Parsons"),
        ("anastasia", "Crowd"),
        ("AndreAn", "Hardacre"),
    ];

    #[test]
    fn test_find_all_in_storage_order() {
        let store = person_store(PEOPLE);
        let rows = store.find_all("person").unwrap();
        assert_eq!(rows.len(), PEOPLE.len());
        assert_eq!(ids(&rows), (0..PEOPLE.len() as i64).collect::<Vec<_>>());
    }

    #[test]
    fn test_find_all_unknown_table() {
        let store = person_store(PEOPLE);
        let err = store.find_all("nobody").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_find_one_round_trip() {
        let store = person_store(PEOPLE);
        let rows = store.find_one("person", 2).unwrap();

        let expected = Row::from([
            ("ID".to_string(), Value::Int(2)),
            ("FIRST_NAME".to_string(), Value::from("Stephanie")),
            ("LAST_NAME".to_string(), Value::from("Dowd")),
        ]);
        assert_eq!(rows, vec![expected]);
    }

    #[test]
    fn test_find_one_missing_id() {
        let store = person_store(PEOPLE);
        let err = store.find_one("person", 99).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_find_one_by_exact() {
        let store = person_store(&[
            ("Andrea", "Baker"),
            ("Angela", "Carr"),
            ("Stephanie", "Dowd"),
            ("stephanie", "Hardacre"),
        ]);

        let rows = store
            .find_one_by("person", [("first_name", "Stephanie")], true)
            .unwrap();
        assert_eq!(ids(&rows), vec![2]);
        assert_eq!(rows[0]["LAST_NAME"], Value::from("Dowd"));

        let rows = store
            .find_one_by("person", [("first_name", "Stephanie")], false)
            .unwrap();
        assert_eq!(ids(&rows), vec![2, 3]);
    }

    #[test]
    fn test_find_one_by_several() {
        let store = person_store(PEOPLE);

        let rows = store
            .find_one_by("person", [("last_name", "Baker")], true)
            .unwrap();
        assert_eq!(first_names(&rows), vec!["Andrea", "Vanessa"]);

        let rows = store
            .find_one_by("person", [("last_name", "Baker")], false)
            .unwrap();
        assert_eq!(first_names(&rows), vec!["Andrea", "Vanessa", "Adrian"]);
    }

    #[test]
    fn test_find_one_by_start() {
        let store = person_store(PEOPLE);

        let rows = store
            .find_one_by("person", [("first_name", "An|START_BY")], true)
            .unwrap();
        assert_eq!(first_names(&rows), vec!["Andrea", "Angela", "AndreAn"]);

        let rows = store
            .find_one_by("person", [("first_name", "An|START_BY")], false)
            .unwrap();
        assert_eq!(
            first_names(&rows),
            vec!["Andrea", "Angela", "anastasia", "AndreAn"]
        );
    }

    #[test]
    fn test_find_one_by_end() {
        let store = person_store(PEOPLE);

        let rows = store
            .find_one_by("person", [("first_name", "an|END_BY")], true)
            .unwrap();
        assert_eq!(first_names(&rows), vec!["Adrian", "Julian"]);

        let rows = store
            .find_one_by("person", [("first_name", "an|END_BY")], false)
            .unwrap();
        assert_eq!(first_names(&rows), vec!["Adrian", "Julian", "AndreAn"]);
    }

    #[test]
    fn test_find_one_by_contains() {
        let store = person_store(&PEOPLE[..6]);

        let rows = store
            .find_one_by("person", [("first_name", "an|CONTAINS")], true)
            .unwrap();
        assert_eq!(
            first_names(&rows),
            vec!["Stephanie", "Vanessa", "Adrian", "Julian"]
        );

        let rows = store
            .find_one_by("person", [("first_name", "an|CONTAINS")], false)
            .unwrap();
        assert_eq!(rows.len(), 6);
    }

    #[test]
    fn test_find_one_by_multiple_filters() {
        let store = person_store(&[
            ("Andrea", "Baker"),
            ("Angela", "Carr"),
            ("Stephanie", "Dowd"),
            ("Vanessa", "Hardacre"),
            ("Adrian", "Lyman"),
            ("Julian", "Parsons"),
        ]);

        let rows = store
            .find_one_by(
                "person",
                [("first_name", "an|CONTAINS"), ("last_name", "er|END_BY")],
                false,
            )
            .unwrap();
        assert_eq!(ids(&rows), vec![0]);
        assert_eq!(first_names(&rows), vec!["Andrea"]);
    }

    #[test]
    fn test_criteria_compose_as_intersection() {
        let store = person_store(PEOPLE);
        let first = store
            .find_one_by("person", [("first_name", "an|CONTAINS")], false)
            .unwrap();
        let second = store
            .find_one_by("person", [("last_name", "Baker")], false)
            .unwrap();
        let both = store
            .find_one_by(
                "person",
                [("first_name", "an|CONTAINS"), ("last_name", "Baker")],
                false,
            )
            .unwrap();

        let expected: Vec<Row> = first.into_iter().filter(|row| second.contains(row)).collect();
        assert_eq!(both, expected);
    }

    #[test]
    fn test_find_matching_with_built_criteria() {
        let store = person_store(PEOPLE);
        let criteria = [
            FilterCriterion::new("first_name", Pattern::StartsWith("an".into()), false).unwrap(),
            FilterCriterion::new("Last_Name", Pattern::Exact("Crowd".into()), true).unwrap(),
        ];

        let rows = store.find_matching("person", &criteria).unwrap();
        assert_eq!(first_names(&rows), vec!["anastasia"]);
    }

    #[test]
    fn test_find_one_by_no_match() {
        let store = person_store(PEOPLE);
        let rows = store
            .find_one_by("person", [("first_name", "Zoe")], false)
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_find_one_by_digit_prefix_is_literal() {
        let store = person_store(&[("R2|START_BY", "Droid"), ("R2D2", "Droid")]);
        let rows = store
            .find_one_by("person", [("first_name", "R2|START_BY")], true)
            .unwrap();
        assert_eq!(first_names(&rows), vec!["R2|START_BY"]);
    }

    #[test]
    fn test_find_one_by_matches_int_column_text() {
        let store = person_store(PEOPLE);
        let rows = store.find_one_by("person", [("id", "3")], true).unwrap();
        assert_eq!(first_names(&rows), vec!["Vanessa"]);
    }

    #[test]
    fn test_find_one_by_float_uses_stored_form() {
        let store = Store::in_memory();
        let schema = TableSchema::build("sizes", [("size", "float")]).unwrap();
        store.create_table(&schema).unwrap();
        let rows = vec![
            Row::from([("size".to_string(), Value::Float(175.0))]),
            Row::from([("size".to_string(), Value::Float(175.5))]),
        ];
        store
            .insert(RowBatch::new(&store, "sizes", rows).unwrap())
            .unwrap();

        let rows = store.find_one_by("sizes", [("size", "175.0")], true).unwrap();
        assert_eq!(ids(&rows), vec![0]);

        let rows = store.find_one_by("sizes", [("size", "175|START_BY")], true).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_find_one_by_rejects_bad_criteria() {
        let store = person_store(PEOPLE);

        let none: [(&str, &str); 0] = [];
        let err = store.find_one_by("person", none, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = store
            .find_one_by("person", [("nickname", "Ace")], true)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);
    }
}
