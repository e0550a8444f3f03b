//! Mapping of the vendor search response to products
//!
//! The vendor nests results as
//! `item.props.pageProps.initialData.searchResult.itemStacks[].items[]`.
//! Every level is optional. The rules are total:
//!
//! - body that is not JSON, or has a field of the wrong type: `Decode` error
//! - any missing container level: empty page
//! - item without `name`, or with blank `name`: dropped
//! - item without `priceInfo.linePrice`, or with blank price: dropped
//! - `image` missing or blank: product without image
//!
//! Dropped items still count towards `raw_count`.

use crate::client::{FetchError, PageResponse};
use crate::types::Product;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct RawResponse {
    #[serde(default)]
    item: Option<RawItem>,
}

#[derive(Debug, Default, Deserialize)]
struct RawItem {
    #[serde(default)]
    props: Option<RawProps>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProps {
    #[serde(default, rename = "pageProps")]
    page_props: Option<RawPageProps>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPageProps {
    #[serde(default, rename = "initialData")]
    initial_data: Option<RawInitialData>,
}

#[derive(Debug, Default, Deserialize)]
struct RawInitialData {
    #[serde(default, rename = "searchResult")]
    search_result: Option<RawSearchResult>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSearchResult {
    #[serde(default, rename = "itemStacks")]
    item_stacks: Option<Vec<RawItemStack>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawItemStack {
    #[serde(default)]
    items: Option<Vec<RawProduct>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProduct {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default, rename = "priceInfo")]
    price_info: Option<RawPriceInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPriceInfo {
    #[serde(default, rename = "linePrice")]
    line_price: Option<String>,
}

/// Parse a response body and map it.
pub fn decode_page(body: &str) -> Result<PageResponse, FetchError> {
    let response: RawResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(map_response(response))
}

/// Map a decoded response. Never fails; see the module docs for the rules.
pub fn map_response(response: RawResponse) -> PageResponse {
    let stacks = response
        .item
        .and_then(|item| item.props)
        .and_then(|props| props.page_props)
        .and_then(|page_props| page_props.initial_data)
        .and_then(|initial_data| initial_data.search_result)
        .and_then(|search_result| search_result.item_stacks)
        .unwrap_or_default();

    let mut page = PageResponse::default();
    for raw in stacks.into_iter().flat_map(|stack| stack.items.unwrap_or_default()) {
        page.raw_count += 1;
        match map_product(raw) {
            Some(product) => page.products.push(product),
            None => log::trace!("Dropping record without name or price"),
        }
    }
    page
}

fn map_product(raw: RawProduct) -> Option<Product> {
    let name = non_blank(raw.name)?;
    let price = non_blank(raw.price_info.and_then(|info| info.line_price))?;
    Some(Product {
        name,
        price,
        image_url: non_blank(raw.image),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
