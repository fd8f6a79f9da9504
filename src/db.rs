use mongodb::{options::ClientOptions, Client, Collection, Database};

use crate::models::task::Task;
use crate::models::user::User;

pub struct MongoDB {
    pub client: Client,
    pub db: Database,
}

impl MongoDB {
    pub async fn init(uri: &str, db_name: &str) -> Self {
        let client_options = ClientOptions::parse(uri)
            .await
            .expect("Failed to parse MongoDB connection string");
        let client = Client::with_options(client_options).expect("Failed to initialize client");
        let db = client.database(db_name);
        MongoDB { client, db }
    }

    pub fn tasks(&self) -> Collection<Task> {
        self.db.collection::<Task>("tasks")
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection::<User>("users")
    }
}
