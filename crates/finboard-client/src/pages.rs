//! Response-shape validation and multi-page walking

use finboard_core::{FetchError, PageQuery, PageResponse, PageSource, Pagination, TransactionRecord};
use serde_json::Value;

/// Parse a paged list body, `{ data: [...], pagination: {...} }`.
///
/// Anything that does not have exactly that shape is `Malformed`, including
/// a single record that fails to deserialize.
pub fn parse_page_response(body: &str) -> Result<PageResponse, FetchError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(format!("body is not JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| FetchError::malformed("body is not an object"))?;

    let data = match object.get("data") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(FetchError::malformed("`data` is not an array")),
        None => return Err(FetchError::malformed("missing `data`")),
    };

    let pagination = object
        .get("pagination")
        .ok_or_else(|| FetchError::malformed("missing `pagination`"))?;
    let pagination: Pagination = serde_json::from_value(pagination.clone())
        .map_err(|e| FetchError::malformed(format!("bad `pagination`: {}", e)))?;

    let data = data
        .iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<TransactionRecord>(item.clone())
                .map_err(|e| FetchError::malformed(format!("record {}: {}", index, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PageResponse { data, pagination })
}

/// Fetch every page of `query`, starting at page 1.
///
/// Stops once `total_items` records have been collected or a page comes
/// back empty.
pub async fn fetch_all<S>(source: &S, query: &PageQuery) -> Result<Vec<TransactionRecord>, FetchError>
where
    S: PageSource + ?Sized,
{
    let mut rows = Vec::new();
    let mut page = 1;

    loop {
        let response = source.fetch_page(&query.with_page(page)).await?;
        if response.data.is_empty() {
            break;
        }
        let total = response.pagination.total_items;
        rows.extend(response.data);
        log::debug!("fetched page {} ({} of {} records)", page, rows.len(), total);
        if rows.len() as u64 >= total {
            break;
        }
        page += 1;
    }

    Ok(rows)
}
