use api_types::{
    car::{CarCreate, CarGet, CarQuery, CarUpdate},
    depot::{DepotCreate, DepotGet, DepotUpdate},
    receipt::{ReceiptCorrect, ReceiptGet},
    rent::{
        RentCreate, RentGet, RentHandOver, RentListResponse, RentQuery, RentReject, RentTakeBack,
    },
    result::{CreateResult, LoginResult, RegistrationResult, ServiceResult},
    stats::Statistics,
    user::{GuestCreate, Login, RoleUpdate, UserGet, UserRegister, UserUpdate},
    waiting_list::{ExpiredEntries, WaitingListEntryGet, WaitingListJoin},
    Role,
};
use chrono::Utc;
use reqwest::{Method, RequestBuilder, Url};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dates::normalize_dates,
    error::{ClientError, Result},
    session::Session,
};

/// Typed client for the rental HTTP API.
///
/// Requests carry `Authorization: Bearer` while the session holds a token,
/// and JSON bodies go through [`normalize_dates`] before they are sent.
#[derive(Debug)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
    session: Session,
}

impl Client {
    pub fn new(base_url: &str, session: Session) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ClientError::Config(format!("invalid base_url: {err}")))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ClientError::Config(format!("invalid endpoint {path}: {err}")))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let mut builder = self.http.request(method, self.endpoint(path)?);
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let res = builder.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res.json::<T>().await?);
        }

        let errors = res
            .json::<ServiceResult>()
            .await
            .map(|envelope| envelope.errors)
            .unwrap_or_else(|_| vec![status.to_string()]);
        tracing::debug!(status = status.as_u16(), ?errors, "request failed");
        Err(ClientError::from_status(status.as_u16(), errors))
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let mut builder = self.request(method, path)?;
        if let Some(body) = body {
            let mut value = serde_json::to_value(body)?;
            normalize_dates(&mut value);
            builder = builder.json(&value);
        }
        self.send(builder).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.call::<Value, T>(Method::GET, path, None).await
    }

    async fn get_with_query<Q: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T> {
        let mut value = serde_json::to_value(query)?;
        normalize_dates(&mut value);
        let builder = self.request(Method::GET, path)?.query(&query_pairs(&value));
        self.send(builder).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.call(Method::POST, path, Some(body)).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.call::<Value, T>(Method::POST, path, None).await
    }

    async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.call(Method::PUT, path, Some(body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.call::<Value, T>(Method::DELETE, path, None).await
    }

    /// Log in and keep the token in the session.
    pub async fn login(&mut self, identifier: &str, password: &str) -> Result<LoginResult> {
        let payload = Login {
            identifier: identifier.to_string(),
            password: password.to_string(),
        };
        let result: LoginResult = self.post("users/login", &payload).await?;
        if let Some(token) = &result.token {
            self.session.store(token, Utc::now())?;
        }
        Ok(result)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.session.logout()
    }

    pub async fn register(&self, payload: &UserRegister) -> Result<RegistrationResult> {
        self.post("users/register", payload).await
    }

    pub async fn me(&self) -> Result<UserGet> {
        self.get("users/me").await
    }

    pub async fn users(&self) -> Result<Vec<UserGet>> {
        self.get("users").await
    }

    pub async fn user(&self, user_id: Uuid) -> Result<UserGet> {
        self.get(&format!("users/{user_id}")).await
    }

    pub async fn update_user(&self, user_id: Uuid, payload: &UserUpdate) -> Result<UserGet> {
        self.put(&format!("users/{user_id}"), payload).await
    }

    pub async fn set_role(&self, user_id: Uuid, role: Role) -> Result<UserGet> {
        self.put(&format!("users/{user_id}/role"), &RoleUpdate { role })
            .await
    }

    pub async fn create_guest(&self, payload: &GuestCreate) -> Result<CreateResult<UserGet>> {
        self.post("users/guest", payload).await
    }

    pub async fn cars(&self, query: &CarQuery) -> Result<Vec<CarGet>> {
        self.get_with_query("cars", query).await
    }

    pub async fn car(&self, car_id: Uuid) -> Result<CarGet> {
        self.get(&format!("cars/{car_id}")).await
    }

    pub async fn create_car(&self, payload: &CarCreate) -> Result<CreateResult<CarGet>> {
        self.post("cars", payload).await
    }

    pub async fn update_car(&self, car_id: Uuid, payload: &CarUpdate) -> Result<CarGet> {
        self.put(&format!("cars/{car_id}"), payload).await
    }

    pub async fn delete_car(&self, car_id: Uuid) -> Result<ServiceResult> {
        self.delete(&format!("cars/{car_id}")).await
    }

    pub async fn depots(&self) -> Result<Vec<DepotGet>> {
        self.get("depots").await
    }

    pub async fn create_depot(&self, payload: &DepotCreate) -> Result<CreateResult<DepotGet>> {
        self.post("depots", payload).await
    }

    pub async fn update_depot(&self, depot_id: Uuid, payload: &DepotUpdate) -> Result<DepotGet> {
        self.put(&format!("depots/{depot_id}"), payload).await
    }

    pub async fn delete_depot(&self, depot_id: Uuid) -> Result<ServiceResult> {
        self.delete(&format!("depots/{depot_id}")).await
    }

    pub async fn create_rent(&self, payload: &RentCreate) -> Result<CreateResult<RentGet>> {
        self.post("rents", payload).await
    }

    pub async fn rents(&self, query: &RentQuery) -> Result<RentListResponse> {
        self.get_with_query("rents", query).await
    }

    pub async fn rent(&self, rent_id: Uuid) -> Result<RentGet> {
        self.get(&format!("rents/{rent_id}")).await
    }

    pub async fn approve_rent(&self, rent_id: Uuid) -> Result<RentGet> {
        self.post_empty(&format!("rents/{rent_id}/approve")).await
    }

    pub async fn reject_rent(&self, rent_id: Uuid, reason: Option<String>) -> Result<RentGet> {
        self.post(&format!("rents/{rent_id}/reject"), &RentReject { reason })
            .await
    }

    pub async fn cancel_rent(&self, rent_id: Uuid) -> Result<RentGet> {
        self.post_empty(&format!("rents/{rent_id}/cancel")).await
    }

    pub async fn request_invoice(&self, rent_id: Uuid) -> Result<RentGet> {
        self.post_empty(&format!("rents/{rent_id}/invoice-request"))
            .await
    }

    pub async fn hand_over(&self, rent_id: Uuid, payload: &RentHandOver) -> Result<RentGet> {
        self.post(&format!("rents/{rent_id}/hand-over"), payload)
            .await
    }

    pub async fn take_back(&self, rent_id: Uuid, payload: &RentTakeBack) -> Result<RentGet> {
        self.post(&format!("rents/{rent_id}/take-back"), payload)
            .await
    }

    pub async fn issue_receipt(&self, rent_id: Uuid) -> Result<CreateResult<ReceiptGet>> {
        self.post_empty(&format!("rents/{rent_id}/receipt")).await
    }

    pub async fn receipt_for_rent(&self, rent_id: Uuid) -> Result<ReceiptGet> {
        self.get(&format!("rents/{rent_id}/receipt")).await
    }

    pub async fn receipts(&self) -> Result<Vec<ReceiptGet>> {
        self.get("receipts").await
    }

    pub async fn correct_receipt(&self, receipt_id: Uuid, total_cost: i64) -> Result<ReceiptGet> {
        self.put(
            &format!("receipts/{receipt_id}"),
            &ReceiptCorrect { total_cost },
        )
        .await
    }

    pub async fn join_waiting_list(
        &self,
        car_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<CreateResult<WaitingListEntryGet>> {
        self.post(
            &format!("cars/{car_id}/waiting-list"),
            &WaitingListJoin { user_id },
        )
        .await
    }

    pub async fn waiting_list(&self, car_id: Uuid) -> Result<Vec<WaitingListEntryGet>> {
        self.get(&format!("cars/{car_id}/waiting-list")).await
    }

    pub async fn notify_next(&self, car_id: Uuid) -> Result<Option<WaitingListEntryGet>> {
        self.post_empty(&format!("cars/{car_id}/waiting-list/notify"))
            .await
    }

    pub async fn confirm_entry(&self, entry_id: Uuid) -> Result<WaitingListEntryGet> {
        self.post_empty(&format!("waiting-list/{entry_id}/confirm"))
            .await
    }

    pub async fn cancel_entry(&self, entry_id: Uuid) -> Result<WaitingListEntryGet> {
        self.post_empty(&format!("waiting-list/{entry_id}/cancel"))
            .await
    }

    pub async fn expire_waiting_list(&self) -> Result<ExpiredEntries> {
        self.post_empty("waiting-list/expire").await
    }

    pub async fn statistics(&self) -> Result<Statistics> {
        self.get("statistics").await
    }
}

/// Flatten a serialized query struct into `key=value` pairs, dropping
/// absent fields.
fn query_pairs(value: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = value else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((key.clone(), text.clone())),
            other => Some((key.clone(), other.to_string())),
        })
        .collect()
}
