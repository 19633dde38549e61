use models::{NewUser, PlanetCollection, RecordPath, UserPatch, UserRecord};
use tracing::{info, instrument, warn};

use crate::{
    batch::{self, BatchOutcome, BatchWrite, ItemOutcome},
    bulk_import::{parse_import, ImportLine},
    errors::ServiceError,
    store::SharedStore,
};

/// Bank users stored under `planets/{planet}/{username}`.
///
/// Each call is exactly one store round trip (bulk import: one per line),
/// and every result is fresh from the store.
#[derive(Clone)]
pub struct UserDirectory {
    store: SharedStore,
}

fn required<'a>(value: &'a str, what: &str) -> Result<&'a str, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::Validation(format!("{what} required")));
    }
    Ok(value)
}

impl UserDirectory {
    pub fn new(store: SharedStore) -> Self { Self { store } }

    /// Look up one user. `Ok(None)` when nothing is stored for that nickname
    /// on that planet.
    #[instrument(skip(self))]
    pub async fn lookup(&self, planet: &str, nickname: &str) -> Result<Option<UserRecord>, ServiceError> {
        let planet = required(planet, "planet")?;
        let nickname = required(nickname, "nickname")?;
        let path = RecordPath::user(planet, nickname)?;
        let found = self.store.fetch(&path).await?;
        Ok(found.and_then(|v| UserRecord::from_stored(nickname, v)))
    }

    /// Create (or merge over) a user after applying the new-record defaults.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn add_user(&self, planet: &str, input: NewUser) -> Result<UserRecord, ServiceError> {
        let planet = required(planet, "planet")?;
        let record = UserRecord::normalize_new(input)?;
        let path = RecordPath::user(planet, &record.username)?;
        self.store.merge(&path, record.clone().into_fields()).await?;
        info!(%path, "user added");
        Ok(record)
    }

    /// Merge the named fields into an existing user's record.
    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, planet: &str, username: &str, patch: UserPatch) -> Result<(), ServiceError> {
        let planet = required(planet, "planet")?;
        let username = required(username, "username")?;
        let path = RecordPath::user(planet, username)?;
        let fields = patch.into_fields(username)?;
        self.store.merge(&path, fields).await?;
        info!(%path, "user updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, planet: &str, username: &str) -> Result<(), ServiceError> {
        let planet = required(planet, "planet")?;
        let username = required(username, "username")?;
        let path = RecordPath::user(planet, username)?;
        self.store.remove(&path).await?;
        info!(%path, "user deleted");
        Ok(())
    }

    /// Every planet with its users, for the admin listing.
    #[instrument(skip(self))]
    pub async fn list_planets(&self) -> Result<Vec<PlanetCollection>, ServiceError> {
        let tree = self.store.fetch(&RecordPath::planets()).await?;
        Ok(tree.map(PlanetCollection::from_tree).unwrap_or_default())
    }

    /// Import pipe-delimited users into `planet`.
    ///
    /// Valid lines are merged concurrently and independently; rejected lines
    /// are reported as failures without a write. The outcome lists every
    /// non-blank line in input order.
    #[instrument(skip(self, text))]
    pub async fn import(&self, planet: &str, text: &str) -> Result<BatchOutcome, ServiceError> {
        let planet = required(planet, "planet")?;
        RecordPath::planet(planet)?;
        let lines = parse_import(text);
        if lines.is_empty() {
            return Err(ServiceError::Validation("nothing to import".into()));
        }

        let mut items: Vec<ItemOutcome> = Vec::new();
        let mut writes: Vec<BatchWrite> = Vec::new();
        for parsed in lines {
            match parsed {
                ImportLine::Valid { line, record } => match RecordPath::user(planet, &record.username) {
                    Ok(path) => writes.push(BatchWrite {
                        index: line,
                        key: record.username.clone(),
                        path,
                        fields: record.into_fields(),
                    }),
                    Err(e) => items.push(ItemOutcome::failed(line, record.username, e.to_string())),
                },
                ImportLine::Rejected { line, raw, reason } => items.push(ItemOutcome::failed(line, raw, reason)),
            }
        }

        items.extend(batch::merge_all(&self.store, writes).await);
        let outcome = BatchOutcome::from_items(items);
        for failure in outcome.failures() {
            warn!(line = failure.index, key = %failure.key, error = ?failure.error, "import line failed");
        }
        info!(succeeded = outcome.succeeded(), failed = outcome.failed(), "import finished");
        Ok(outcome)
    }
}
