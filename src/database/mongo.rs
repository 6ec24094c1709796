use super::{UserStore, USERS};
use crate::{
    auth::AuthError,
    model::{Profile, User},
};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::error::{Error, ErrorKind, WriteFailure};
use mongodb::options::{FindOneOptions, FindOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};

pub const EMAIL_INDEX: &str = "email_1";

const DUPLICATE_KEY: i32 = 11000;
const NAMESPACE_NOT_FOUND: i32 = 26;

pub async fn connect(url: &str, database: &str) -> anyhow::Result<Database> {
    let client = Client::with_uri_str(url).await?;
    let db = client.database(database);
    db.run_command(doc! { "ping": 1 }, None).await?;
    tracing::info!("connected to mongodb database {}", database);
    Ok(db)
}

/// Creates the unique `email` index unless the collection already has it.
pub async fn require_unique_email(collection: &Collection<User>) -> anyhow::Result<()> {
    let names = match collection.list_index_names().await {
        Ok(names) => names,
        Err(err) if command_code(&err) == Some(NAMESPACE_NOT_FOUND) => Vec::new(),
        Err(err) => return Err(err.into()),
    };
    if names.iter().any(|name| name == EMAIL_INDEX) {
        return Ok(());
    }

    let index = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(
            IndexOptions::builder()
                .unique(true)
                .name(EMAIL_INDEX.to_owned())
                .build(),
        )
        .build();
    collection.create_index(index, None).await?;
    tracing::info!(collection = %collection.name(), "created unique email index");
    Ok(())
}

fn command_code(err: &Error) -> Option<i32> {
    match *err.kind {
        ErrorKind::Command(ref command) => Some(command.code),
        _ => None,
    }
}

fn is_duplicate_key(err: &Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write)) if write.code == DUPLICATE_KEY
    )
}

fn without_password() -> Document {
    doc! { "password": 0 }
}

#[derive(Clone, Debug)]
pub struct MongoUserStore {
    users: Collection<User>,
}

impl MongoUserStore {
    pub async fn new(db: &Database) -> anyhow::Result<Self> {
        let users = db.collection::<User>(USERS);
        require_unique_email(&users).await?;
        Ok(Self { users })
    }

    fn profiles(&self) -> Collection<Profile> {
        self.users.clone_with_type()
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, user: &User) -> anyhow::Result<()> {
        match self.users.insert_one(user, None).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => Err(AuthError::EmailTaken.into()),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users.find_one(doc! { "email": email }, None).await?)
    }

    async fn profile(&self, id: &ObjectId) -> anyhow::Result<Option<Profile>> {
        let options = FindOneOptions::builder()
            .projection(without_password())
            .build();
        Ok(self
            .profiles()
            .find_one(doc! { "_id": *id }, options)
            .await?)
    }

    async fn profiles_except(&self, id: &ObjectId) -> anyhow::Result<Vec<Profile>> {
        let options = FindOptions::builder()
            .projection(without_password())
            .build();
        let cursor = self
            .profiles()
            .find(doc! { "_id": { "$ne": *id } }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn delete(&self, id: &ObjectId) -> anyhow::Result<bool> {
        let deleted = self
            .users
            .find_one_and_delete(doc! { "_id": *id }, None)
            .await?;
        Ok(deleted.is_some())
    }
}
