use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::{header, Method, RequestBuilder, Response};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::RemoteConfig;
use crate::model::ListKind;

use super::api_types::{ConfigRow, ListRow, StoredVoucher, NEXT_VOUCHER_NUMBER_KEY};

const VOUCHERS_TABLE: &str = "vouchers";
const LISTS_TABLE: &str = "lists";
const CONFIG_TABLE: &str = "config";

/// Hosted tabular backing store.
///
/// Every method is one independent request. Callers decide what a failure
/// means; implementations just report it.
#[async_trait]
pub trait RemoteStore: Send + Sync {
  /// All vouchers, highest voucher number first
  async fn fetch_vouchers(&self) -> Result<Vec<StoredVoucher>>;

  /// Every reference list entry across all categories
  async fn fetch_list_rows(&self) -> Result<Vec<ListRow>>;

  /// Stored counter, `None` if the config row doesn't exist yet
  async fn fetch_next_voucher_number(&self) -> Result<Option<u32>>;

  async fn upsert_voucher(&self, voucher: &StoredVoucher) -> Result<()>;

  async fn delete_voucher(&self, id: i64) -> Result<()>;

  /// Insert an entry; an existing (type, name) pair is left alone
  async fn insert_list_item(&self, kind: ListKind, name: &str) -> Result<()>;

  async fn delete_list_item(&self, kind: ListKind, name: &str) -> Result<()>;

  async fn rename_list_item(&self, kind: ListKind, old_name: &str, new_name: &str) -> Result<()>;

  async fn set_next_voucher_number(&self, value: u32) -> Result<()>;
}

/// PostgREST (Supabase) implementation of [`RemoteStore`]
#[derive(Clone)]
pub struct SupabaseClient {
  http: reqwest::Client,
  rest_base: Url,
  key: String,
  schema: String,
}

impl SupabaseClient {
  pub fn new(config: &RemoteConfig, key: String) -> Result<Self> {
    let mut base = Url::parse(config.url.trim())
      .map_err(|e| eyre!("Invalid remote URL '{}': {}", config.url, e))?;
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }
    let rest_base = base
      .join("rest/v1/")
      .map_err(|e| eyre!("Invalid remote URL '{}': {}", config.url, e))?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      rest_base,
      key,
      schema: config.schema.clone(),
    })
  }

  fn table_url(&self, table: &str) -> Result<Url> {
    self
      .rest_base
      .join(table)
      .map_err(|e| eyre!("Failed to build URL for table {}: {}", table, e))
  }

  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    debug!(%method, %url, "remote request");
    self
      .http
      .request(method, url)
      .header("apikey", &self.key)
      .header(header::AUTHORIZATION, format!("Bearer {}", self.key))
      .header("Accept-Profile", &self.schema)
      .header("Content-Profile", &self.schema)
  }

  async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
    let response = builder
      .send()
      .await
      .map_err(|e| eyre!("Failed to {}: {}", what, e))?;

    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(eyre!("Failed to {}: HTTP {} {}", what, status, body))
  }

  async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
    let response = self.send(self.request(Method::GET, url), what).await?;
    response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse response ({}): {}", what, e))
  }

  fn list_filter(&self, kind: ListKind, name: &str) -> Result<Url> {
    let mut url = self.table_url(LISTS_TABLE)?;
    url
      .query_pairs_mut()
      .append_pair("type", &format!("eq.{}", kind.tag()))
      .append_pair("name", &format!("eq.{}", name));
    Ok(url)
  }
}

#[async_trait]
impl RemoteStore for SupabaseClient {
  async fn fetch_vouchers(&self) -> Result<Vec<StoredVoucher>> {
    let mut url = self.table_url(VOUCHERS_TABLE)?;
    url
      .query_pairs_mut()
      .append_pair("select", "*")
      .append_pair("order", "vouchernumber.desc");
    self.get_json(url, "fetch vouchers").await
  }

  async fn fetch_list_rows(&self) -> Result<Vec<ListRow>> {
    let mut url = self.table_url(LISTS_TABLE)?;
    url.query_pairs_mut().append_pair("select", "type,name");
    self.get_json(url, "fetch lists").await
  }

  async fn fetch_next_voucher_number(&self) -> Result<Option<u32>> {
    let mut url = self.table_url(CONFIG_TABLE)?;
    url
      .query_pairs_mut()
      .append_pair("select", "key,value")
      .append_pair("key", &format!("eq.{}", NEXT_VOUCHER_NUMBER_KEY));
    let rows: Vec<ConfigRow> = self.get_json(url, "fetch voucher counter").await?;

    match rows.first() {
      None => Ok(None),
      Some(row) => row
        .as_counter()
        .map(Some)
        .ok_or_else(|| eyre!("Invalid voucher counter value: {}", row.value)),
    }
  }

  async fn upsert_voucher(&self, voucher: &StoredVoucher) -> Result<()> {
    let mut url = self.table_url(VOUCHERS_TABLE)?;
    url.query_pairs_mut().append_pair("on_conflict", "id");
    let builder = self
      .request(Method::POST, url)
      .header("Prefer", "resolution=merge-duplicates,return=minimal")
      .json(voucher);
    self.send(builder, "upsert voucher").await?;
    Ok(())
  }

  async fn delete_voucher(&self, id: i64) -> Result<()> {
    let mut url = self.table_url(VOUCHERS_TABLE)?;
    url
      .query_pairs_mut()
      .append_pair("id", &format!("eq.{}", id));
    self
      .send(self.request(Method::DELETE, url), "delete voucher")
      .await?;
    Ok(())
  }

  async fn insert_list_item(&self, kind: ListKind, name: &str) -> Result<()> {
    let mut url = self.table_url(LISTS_TABLE)?;
    url.query_pairs_mut().append_pair("on_conflict", "type,name");
    let builder = self
      .request(Method::POST, url)
      .header("Prefer", "resolution=ignore-duplicates,return=minimal")
      .json(&ListRow::new(kind, name));
    self.send(builder, "add list item").await?;
    Ok(())
  }

  async fn delete_list_item(&self, kind: ListKind, name: &str) -> Result<()> {
    let url = self.list_filter(kind, name)?;
    self
      .send(self.request(Method::DELETE, url), "delete list item")
      .await?;
    Ok(())
  }

  async fn rename_list_item(&self, kind: ListKind, old_name: &str, new_name: &str) -> Result<()> {
    let url = self.list_filter(kind, old_name)?;
    let builder = self
      .request(Method::PATCH, url)
      .header("Prefer", "return=minimal")
      .json(&json!({ "name": new_name }));
    self.send(builder, "rename list item").await?;
    Ok(())
  }

  async fn set_next_voucher_number(&self, value: u32) -> Result<()> {
    let mut url = self.table_url(CONFIG_TABLE)?;
    url.query_pairs_mut().append_pair("on_conflict", "key");
    let row = ConfigRow {
      key: NEXT_VOUCHER_NUMBER_KEY.to_string(),
      value: Value::from(value),
    };
    let builder = self
      .request(Method::POST, url)
      .header("Prefer", "resolution=merge-duplicates,return=minimal")
      .json(&row);
    self.send(builder, "update voucher counter").await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn remote(url: &str) -> RemoteConfig {
    RemoteConfig {
      url: url.to_string(),
      schema: "public".to_string(),
      timeout_secs: 5,
    }
  }

  #[test]
  fn test_table_urls() {
    let client = SupabaseClient::new(&remote("https://abc.supabase.co"), "k".to_string()).unwrap();
    assert_eq!(
      client.table_url("vouchers").unwrap().as_str(),
      "https://abc.supabase.co/rest/v1/vouchers"
    );

    let client =
      SupabaseClient::new(&remote("http://localhost:54321/proxy"), "k".to_string()).unwrap();
    assert_eq!(
      client.table_url("lists").unwrap().as_str(),
      "http://localhost:54321/proxy/rest/v1/lists"
    );
  }

  #[test]
  fn test_list_filter_is_encoded() {
    let client = SupabaseClient::new(&remote("https://abc.supabase.co"), "k".to_string()).unwrap();
    let url = client
      .list_filter(ListKind::Supplier, "Hotel & Spa")
      .unwrap();
    assert_eq!(
      url.query(),
      Some("type=eq.supplier&name=eq.Hotel+%26+Spa")
    );
  }

  #[test]
  fn test_invalid_url_is_rejected() {
    assert!(SupabaseClient::new(&remote("not a url"), "k".to_string()).is_err());
  }
}
