use log::{debug, error, info, warn};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::backend::FindError;
use crate::daily_study::{DailyStudy, DailyStudyUpdate};
use crate::progress::{ProgressData, ProgressUpdate};
use crate::syllabus::Subject;
use crate::time::Timestamp;
use crate::user::{Avatar, NewUser, User};

mod value;
use value::{Document, Fields, Value};

type Result<T> = std::result::Result<T, ()>;

const USERS: &str = "users";
const PROGRESS: &str = "progress";
const DAILY_STUDY: &str = "dailyStudy";

#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// e.g. `https://firestore.googleapis.com/v1`, or an emulator's `http://localhost:8080/v1`
    pub base_url: String,
    pub project: String,
    pub api_key: Option<String>,
    pub token: Option<String>,
}

/// Document store backend speaking Firestore's REST API.
///
/// Reads never fail: errors are logged and come back as nothing found.
/// Writes report failure to the caller.
pub struct Backend {
    client: Client,
    config: FirestoreConfig,
    database: String,
}

/// Documents stay raw until `documents` decodes them one at a time.
#[derive(Debug, Deserialize)]
struct QueryResult {
    document: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    #[serde(default)]
    write_results: Vec<WriteResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteResult {
    #[serde(default)]
    transform_results: Vec<Value>,
}

impl Backend {
    pub fn new(config: FirestoreConfig) -> Self {
        let database = format!("projects/{}/databases/(default)", config.project);
        info!(
            "using firestore project {} at {}",
            config.project, config.base_url
        );

        Self {
            client: Client::new(),
            config,
            database,
        }
    }

    fn url(&self, rest: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.database,
            rest
        )
    }

    fn doc_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{collection}/{id}", self.database)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        let req = match self.config.api_key {
            Some(ref key) => req.query(&[("key", key)]),
            None => req,
        };
        match self.config.token {
            Some(ref token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> std::result::Result<T, FindError> {
        let resp = self.authed(req).send().await.map_err(|e| {
            error!("firestore request: {e}");
            FindError::Internal
        })?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FindError::NotFound);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("firestore returned {status}: {body}");
            return Err(FindError::Internal);
        }

        resp.json().await.map_err(|e| {
            error!("couldn't decode firestore response: {e}");
            FindError::Internal
        })
    }

    async fn get(&self, collection: &str, id: &str) -> Option<Document> {
        let req = self.client.get(self.url(&format!("documents/{collection}/{id}")));

        match self.send(req).await {
            Ok(doc) => Some(doc),
            Err(FindError::NotFound) => {
                debug!("no {collection} document {id}");
                None
            }
            Err(FindError::Internal) => {
                error!("couldn't get {collection} document {id}");
                None
            }
        }
    }

    /// Documents whose fields equal each `(field, value)` pair.
    async fn query(&self, collection: &str, filters: &[(&str, &str)]) -> Vec<Document> {
        let field_filter = |(field, value): &(&str, &str)| {
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": Value::from(*value),
                }
            })
        };

        let mut structured = json!({ "from": [{ "collectionId": collection }] });
        match filters {
            [] => {}
            [single] => structured["where"] = field_filter(single),
            many => {
                structured["where"] = json!({
                    "compositeFilter": {
                        "op": "AND",
                        "filters": many.iter().map(field_filter).collect::<Vec<_>>(),
                    }
                })
            }
        }

        let req = self
            .client
            .post(self.url("documents:runQuery"))
            .json(&json!({ "structuredQuery": structured }));

        match self.send::<Vec<QueryResult>>(req).await {
            Ok(results) => documents(collection, results),
            Err(e) => {
                error!("couldn't query {collection} ({filters:?}): {e:?}");
                vec![]
            }
        }
    }

    async fn commit(&self, write: serde_json::Value) -> Result<CommitResponse> {
        let req = self
            .client
            .post(self.url("documents:commit"))
            .json(&json!({ "writes": [write] }));

        self.send(req).await.map_err(|e| {
            error!("firestore commit failed: {e:?}");
        })
    }

    fn write(
        &self,
        collection: &str,
        id: &str,
        fields: &Fields,
        update_mask: Option<&[&str]>,
        server_time: Option<&str>,
    ) -> serde_json::Value {
        let mut write = json!({
            "update": { "name": self.doc_name(collection, id), "fields": fields },
            "currentDocument": { "exists": update_mask.is_some() },
        });
        if let Some(mask) = update_mask {
            write["updateMask"] = json!({ "fieldPaths": mask });
        }
        if let Some(field) = server_time {
            write["updateTransforms"] = json!([
                { "fieldPath": field, "setToServerValue": "REQUEST_TIME" }
            ]);
        }
        write
    }
}

fn documents(collection: &str, results: Vec<QueryResult>) -> Vec<Document> {
    results
        .into_iter()
        .filter_map(|r| r.document)
        .filter_map(|doc| {
            let name = doc["name"].as_str().unwrap_or_default().to_string();
            serde_json::from_value(doc)
                .map_err(|e| error!("skipping undecodable {collection} document {name}: {e}"))
                .ok()
        })
        .collect()
}

/// The time the server stamped on a write, or ours if it didn't say.
fn server_time(resp: &CommitResponse) -> Timestamp {
    resp.write_results
        .first()
        .and_then(|r| r.transform_results.first())
        .and_then(|v| match v {
            Value::TimestampValue(s) => Timestamp::from_server(s).ok(),
            _ => None,
        })
        .unwrap_or_else(Timestamp::now)
}

fn decode<T>(doc: &Document, kind: &str, f: impl FnOnce(&Document) -> std::result::Result<T, String>) -> Option<T> {
    f(doc)
        .map_err(|e| error!("invalid {kind} document {}: {e}", doc.id()))
        .ok()
}

/// `key`'s timestamp. Older documents may lack it, in which case the
/// document's own update time stands in.
fn stamp(doc: &Document, key: &str) -> std::result::Result<Timestamp, String> {
    if doc.fields.contains_key(key) {
        return value::timestamp(&doc.fields, key);
    }

    warn!("document {} has no {key}, using its update time", doc.id());
    Ok(doc
        .update_time
        .as_deref()
        .and_then(|t| Timestamp::from_server(t).ok())
        .unwrap_or_else(Timestamp::now))
}

fn user_from(doc: &Document) -> std::result::Result<User, String> {
    let f = &doc.fields;
    let avatar = value::string(f, "avatar")?;

    Ok(User {
        id: doc.id().into(),
        username: value::string(f, "username")?.into(),
        password: value::string(f, "password")?.into(),
        avatar: Avatar::try_from(avatar).map_err(|()| format!("unknown avatar \"{avatar}\""))?,
        display_name: value::string(f, "displayName")?.into(),
    })
}

fn progress_from(doc: &Document) -> std::result::Result<ProgressData, String> {
    let f = &doc.fields;
    let subject = value::string(f, "subject")?;

    Ok(ProgressData {
        id: doc.id().into(),
        user_id: value::string(f, "userId")?.into(),
        subject: Subject::try_from(subject).map_err(|()| format!("unknown subject \"{subject}\""))?,
        topic_progress: value::bool_map(f, "topicProgress")?,
        updated_at: stamp(doc, "updatedAt")?,
    })
}

fn daily_study_from(doc: &Document) -> std::result::Result<DailyStudy, String> {
    let f = &doc.fields;

    Ok(DailyStudy {
        id: doc.id().into(),
        user_id: value::string(f, "userId")?.into(),
        study_plan: value::string(f, "studyPlan")?.into(),
        date: value::string(f, "date")?.into(),
        created_at: stamp(doc, "createdAt")?,
    })
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl Backend {
    pub async fn get_user(&self, id: &str) -> Option<User> {
        let doc = self.get(USERS, id).await?;
        decode(&doc, "user", user_from)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Option<User> {
        let docs = self.query(USERS, &[("username", username)]).await;
        docs.first().and_then(|doc| decode(doc, "user", user_from))
    }

    pub async fn create_user(&self, new: NewUser) -> Result<User> {
        let id = new_id();
        let fields = Fields::from([
            ("username".into(), Value::from(new.username.as_str())),
            ("password".into(), Value::from(new.password.as_str())),
            ("avatar".into(), Value::from(new.avatar.as_str())),
            ("displayName".into(), Value::from(new.display_name.as_str())),
        ]);

        self.commit(self.write(USERS, &id, &fields, None, None))
            .await
            .map_err(|()| error!("couldn't create user {}", new.username))?;

        Ok(User::from_new(id, new))
    }

    pub async fn get_all_users(&self) -> Vec<User> {
        self.query(USERS, &[])
            .await
            .iter()
            .filter_map(|doc| decode(doc, "user", user_from))
            .collect()
    }
}

impl Backend {
    pub async fn get_progress_data(&self, user_id: &str, subject: Subject) -> Option<ProgressData> {
        let docs = self
            .query(PROGRESS, &[("userId", user_id), ("subject", subject.as_str())])
            .await;
        docs.first().and_then(|doc| decode(doc, "progress", progress_from))
    }

    pub async fn get_all_progress_data(&self, user_id: &str) -> Vec<ProgressData> {
        self.query(PROGRESS, &[("userId", user_id)])
            .await
            .iter()
            .filter_map(|doc| decode(doc, "progress", progress_from))
            .collect()
    }

    pub async fn upsert_progress_data(&self, update: ProgressUpdate) -> Result<ProgressData> {
        let existing = self.get_progress_data(&update.user_id, update.subject).await;
        let topic_progress = Value::from(&update.topic_progress);

        let (id, write) = match existing {
            Some(existing) => {
                let fields = Fields::from([("topicProgress".into(), topic_progress)]);
                let write = self.write(
                    PROGRESS,
                    &existing.id,
                    &fields,
                    Some(&["topicProgress"]),
                    Some("updatedAt"),
                );
                (existing.id, write)
            }
            None => {
                let id = new_id();
                let fields = Fields::from([
                    ("userId".into(), Value::from(update.user_id.as_str())),
                    ("subject".into(), Value::from(update.subject.as_str())),
                    ("topicProgress".into(), topic_progress),
                ]);
                let write = self.write(PROGRESS, &id, &fields, None, Some("updatedAt"));
                (id, write)
            }
        };

        let resp = self.commit(write).await.map_err(|()| {
            error!(
                "couldn't store {} progress for {}",
                update.subject.as_str(),
                update.user_id
            )
        })?;

        Ok(ProgressData::from_update(id, update, server_time(&resp)))
    }
}

impl Backend {
    pub async fn get_daily_study(&self, user_id: &str, date: &str) -> Option<DailyStudy> {
        let docs = self
            .query(DAILY_STUDY, &[("userId", user_id), ("date", date)])
            .await;
        docs.first().and_then(|doc| decode(doc, "daily study", daily_study_from))
    }

    pub async fn upsert_daily_study(&self, update: DailyStudyUpdate) -> Result<DailyStudy> {
        let existing = self.get_daily_study(&update.user_id, &update.date).await;

        match existing {
            Some(mut existing) => {
                let fields = Fields::from([("studyPlan".into(), Value::from(update.study_plan.as_str()))]);
                let write = self.write(DAILY_STUDY, &existing.id, &fields, Some(&["studyPlan"]), None);

                self.commit(write).await.map_err(|()| {
                    error!("couldn't update {}'s plan for {}", update.user_id, update.date)
                })?;

                existing.study_plan = update.study_plan;
                Ok(existing)
            }
            None => {
                let id = new_id();
                let fields = Fields::from([
                    ("userId".into(), Value::from(update.user_id.as_str())),
                    ("studyPlan".into(), Value::from(update.study_plan.as_str())),
                    ("date".into(), Value::from(update.date.as_str())),
                ]);
                let write = self.write(DAILY_STUDY, &id, &fields, None, Some("createdAt"));

                let resp = self.commit(write).await.map_err(|()| {
                    error!("couldn't create {}'s plan for {}", update.user_id, update.date)
                })?;

                Ok(DailyStudy::from_update(id, update, server_time(&resp)))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // nothing listens on port 1
    fn unreachable() -> Backend {
        Backend::new(FirestoreConfig {
            base_url: "http://127.0.0.1:1/v1".into(),
            project: "studysync-test".into(),
            api_key: None,
            token: None,
        })
    }

    #[tokio::test]
    async fn reads_fail_soft() {
        let backend = unreachable();

        assert_eq!(backend.get_user("u1").await, None);
        assert_eq!(backend.get_user_by_username("him").await, None);
        assert!(backend.get_all_users().await.is_empty());
        assert!(backend.get_all_progress_data("u1").await.is_empty());
        assert_eq!(backend.get_progress_data("u1", Subject::Physics).await, None);
        assert_eq!(backend.get_daily_study("u1", "2024-01-01").await, None);
    }

    #[tokio::test]
    async fn writes_fail_loudly() {
        let backend = unreachable();

        let progress = backend
            .upsert_progress_data(ProgressUpdate {
                user_id: "u1".into(),
                subject: Subject::Chemistry,
                topic_progress: Default::default(),
            })
            .await;
        assert!(progress.is_err());

        let study = backend
            .upsert_daily_study(DailyStudyUpdate {
                user_id: "u1".into(),
                study_plan: "organic".into(),
                date: "2024-01-01".into(),
            })
            .await;
        assert!(study.is_err());
    }

    #[test]
    fn new_documents_must_not_exist() {
        let backend = unreachable();
        let write = backend.write(PROGRESS, "p1", &Fields::new(), None, Some("updatedAt"));

        assert_eq!(
            write,
            json!({
                "update": {
                    "name": "projects/studysync-test/databases/(default)/documents/progress/p1",
                    "fields": {},
                },
                "currentDocument": { "exists": false },
                "updateTransforms": [
                    { "fieldPath": "updatedAt", "setToServerValue": "REQUEST_TIME" }
                ],
            })
        );
    }

    #[test]
    fn updates_are_masked() {
        let backend = unreachable();
        let write = backend.write(DAILY_STUDY, "d1", &Fields::new(), Some(&["studyPlan"]), None);

        assert_eq!(write["currentDocument"], json!({ "exists": true }));
        assert_eq!(write["updateMask"], json!({ "fieldPaths": ["studyPlan"] }));
        assert!(write.get("updateTransforms").is_none());
    }

    #[test]
    fn decodes_users() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/users/x1",
            "fields": {
                "username": { "stringValue": "her" },
                "password": { "stringValue": "1234" },
                "avatar": { "stringValue": "girl" },
                "displayName": { "stringValue": "Her" },
            }
        }))
        .unwrap();

        let user = user_from(&doc).unwrap();
        assert_eq!(user.id, "x1");
        assert_eq!(user.avatar, Avatar::Girl);
    }

    #[test]
    fn rejects_unknown_subjects() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/progress/x1",
            "fields": {
                "userId": { "stringValue": "u1" },
                "subject": { "stringValue": "biology" },
                "updatedAt": { "timestampValue": "2024-01-01T00:00:00Z" },
            }
        }))
        .unwrap();

        assert!(progress_from(&doc).is_err());
    }

    #[test]
    fn one_odd_document_does_not_sink_a_query() {
        let results: Vec<QueryResult> = serde_json::from_value(json!([
            {
                "document": {
                    "name": "projects/p/databases/(default)/documents/users/a1",
                    "fields": {
                        "username": { "stringValue": "him" },
                        "password": { "stringValue": "80085" },
                        "avatar": { "stringValue": "boy" },
                        "displayName": { "stringValue": "Him" },
                        "photo": { "referenceValue": "projects/p/databases/(default)/documents/photos/1" },
                    }
                },
                "readTime": "2024-06-01T00:00:00Z",
            },
            {
                "document": {
                    "name": "projects/p/databases/(default)/documents/users/b2",
                    "fields": { "username": { "somethingNewValue": 7 } }
                },
            },
            {
                "document": {
                    "name": "projects/p/databases/(default)/documents/users/c3",
                    "fields": {
                        "username": { "stringValue": "her" },
                        "password": { "stringValue": "1234" },
                        "avatar": { "stringValue": "girl" },
                        "displayName": { "stringValue": "Her" },
                    }
                },
            },
            { "readTime": "2024-06-01T00:00:00Z" },
        ]))
        .unwrap();

        let docs = documents(USERS, results);
        let names: Vec<_> = docs
            .iter()
            .filter_map(|doc| decode(doc, "user", user_from))
            .map(|u| u.username)
            .collect();

        assert_eq!(names, ["him", "her"]);
    }

    #[test]
    fn missing_timestamps_fall_back_to_the_update_time() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/dailyStudy/d1",
            "fields": {
                "userId": { "stringValue": "u1" },
                "studyPlan": { "stringValue": "vectors" },
                "date": { "stringValue": "2024-02-02" },
            },
            "updateTime": "2024-02-02T08:00:00Z",
        }))
        .unwrap();

        let study = daily_study_from(&doc).unwrap();
        assert_eq!(
            study.created_at,
            Timestamp::from(::time::macros::datetime!(2024-02-02 08:00:00 UTC))
        );

        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/progress/p1",
            "fields": {
                "userId": { "stringValue": "u1" },
                "subject": { "stringValue": "chemistry" },
            },
        }))
        .unwrap();
        assert!(progress_from(&doc).is_ok());

        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/progress/p2",
            "fields": {
                "userId": { "stringValue": "u1" },
                "subject": { "stringValue": "chemistry" },
                "updatedAt": { "stringValue": "last tuesday" },
            },
        }))
        .unwrap();
        assert!(progress_from(&doc).is_err());
    }

    #[test]
    fn commit_time_comes_from_the_transform() {
        let resp: CommitResponse = serde_json::from_value(json!({
            "writeResults": [{
                "updateTime": "2024-06-01T00:00:00.1Z",
                "transformResults": [{ "timestampValue": "2024-06-01T00:00:00Z" }],
            }],
            "commitTime": "2024-06-01T00:00:00.1Z",
        }))
        .unwrap();

        assert_eq!(
            server_time(&resp),
            Timestamp::from(::time::macros::datetime!(2024-06-01 00:00:00 UTC))
        );
    }
}
