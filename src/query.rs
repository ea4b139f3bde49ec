//! DAX query requests and result extraction

use serde::Serialize;

use crate::client::ApiResponse;
use crate::error::PbiError;

/// One result row: column name (e.g. `[Sales Amount]`) to value
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Lists every (table, column) pair of a dataset
pub const TABLE_STATISTICS_QUERY: &str =
    "EVALUATE SUMMARIZE (COLUMNSTATISTICS(), [Table Name], [Column Name])";

const TABLE_NAME_COLUMN: &str = "[Table Name]";

/// Body of `POST .../executeQueries`
#[derive(Debug, Serialize)]
pub(crate) struct ExecuteQueriesRequest<'a> {
    queries: [DaxQuery<'a>; 1],
}

#[derive(Debug, Serialize)]
struct DaxQuery<'a> {
    query: &'a str,
}

impl<'a> ExecuteQueriesRequest<'a> {
    pub(crate) fn single(query: &'a str) -> Self {
        Self {
            queries: [DaxQuery { query }],
        }
    }
}

/// All rows of the first table of the first result.
///
/// A recognized error body (top-level `error`, or `error` on the first
/// result) becomes `PbiError::Api`. Any other failure, including a success
/// status with an unexpected shape, becomes the bare `PbiError::Status`.
pub fn result_rows(response: &ApiResponse) -> Result<Vec<Row>, PbiError> {
    let status = response.status;
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&response.body) else {
        return Err(PbiError::Status(status));
    };

    if let Some(err) = PbiError::from_error_value(status, &value) {
        return Err(err);
    }

    let first_result = value
        .get("results")
        .and_then(|r| r.as_array())
        .and_then(|r| r.first());

    if let Some(err) = first_result.and_then(|r| PbiError::from_error_value(status, r)) {
        return Err(err);
    }

    if !response.is_success() {
        return Err(PbiError::Status(status));
    }

    let rows = first_result
        .and_then(|r| r.get("tables"))
        .and_then(|t| t.as_array())
        .and_then(|t| t.first())
        .and_then(|t| t.get("rows"))
        .and_then(|r| r.as_array())
        .ok_or(PbiError::Status(status))?;

    Ok(rows
        .iter()
        .filter_map(|row| row.as_object().cloned())
        .collect())
}

/// First row of the first table; `None` when the table is empty
pub fn first_row(response: &ApiResponse) -> Result<Option<Row>, PbiError> {
    Ok(result_rows(response)?.into_iter().next())
}

/// Distinct `[Table Name]` values in first-seen order
pub fn distinct_table_names(rows: &[Row]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in rows
        .iter()
        .filter_map(|row| row.get(TABLE_NAME_COLUMN))
        .filter_map(|v| v.as_str())
    {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: serde_json::Value) -> ApiResponse {
        ApiResponse {
            status,
            body: body.to_string(),
            request_id: None,
        }
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(ExecuteQueriesRequest::single("EVALUATE ROW(\"x\", 1)")).unwrap();
        assert_eq!(body, json!({"queries": [{"query": "EVALUATE ROW(\"x\", 1)"}]}));
    }

    #[test]
    fn test_first_row_success() {
        let resp = response(
            200,
            json!({"results":[{"tables":[{"rows":[{"[Sales Amount]": 1250.5},{"[Sales Amount]": 3}]}]}]}),
        );
        let row = first_row(&resp).unwrap().unwrap();
        assert_eq!(row.get("[Sales Amount]"), Some(&json!(1250.5)));
    }

    #[test]
    fn test_first_row_empty_table() {
        let resp = response(200, json!({"results":[{"tables":[{"rows":[]}]}]}));
        assert!(first_row(&resp).unwrap().is_none());
    }

    #[test]
    fn test_top_level_api_error() {
        let resp = response(
            400,
            json!({"error":{"code":"DatasetExecuteQueriesError","message":"Failed to execute the DAX query."}}),
        );
        match first_row(&resp).unwrap_err() {
            PbiError::Api { status, message, .. } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Failed to execute the DAX query.");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_result_level_api_error() {
        let resp = response(
            200,
            json!({"results":[{"error":{"code":"QueryError","message":"Syntax error near EVALUATE"}}]}),
        );
        let err = first_row(&resp).unwrap_err();
        assert!(matches!(err, PbiError::Api { status: 200, .. }), "{err:?}");
    }

    #[test]
    fn test_other_failures_are_bare_status() {
        let not_json = ApiResponse {
            status: 502,
            body: "Bad Gateway".into(),
            request_id: None,
        };
        assert!(matches!(first_row(&not_json), Err(PbiError::Status(502))));

        let no_tables = response(200, json!({"results":[{}]}));
        assert!(matches!(first_row(&no_tables), Err(PbiError::Status(200))));

        let unknown_error_shape = response(500, json!({"message": "boom"}));
        assert!(matches!(first_row(&unknown_error_shape), Err(PbiError::Status(500))));
    }

    #[test]
    fn test_distinct_table_names_keeps_first_seen_order() {
        let resp = response(
            200,
            json!({"results":[{"tables":[{"rows":[
                {"[Table Name]":"Sales","[Column Name]":"Amount"},
                {"[Table Name]":"Sales","[Column Name]":"Date"},
                {"[Table Name]":"Calendar","[Column Name]":"Date"},
                {"[Table Name]":"Sales","[Column Name]":"RowNumber-2662979B"},
                {"[Table Name]":"Customer","[Column Name]":"Name"}
            ]}]}]}),
        );
        let rows = result_rows(&resp).unwrap();
        assert_eq!(distinct_table_names(&rows), vec!["Sales", "Calendar", "Customer"]);
    }
}
