//! CRUD contracts exercised through an in-memory store

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::database::TableName;
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::{GeneralCrudAsync, GeneralCrudSync};

#[derive(Debug, Clone, PartialEq)]
struct Question {
    id: Uuid,
    phrase: String,
}

impl TableName for Question {}

struct QuestionInput {
    phrase: String,
}

type Store = Arc<Mutex<BTreeMap<Uuid, Question>>>;

struct QuestionCrud {
    session: Store,
}

impl QuestionCrud {
    fn missing(id: Uuid) -> ServiceError {
        ServiceError::new(format!("{} {} does not exist", Question::table_name(), id))
    }

    fn insert(&self, input: QuestionInput) -> Question {
        let question = Question {
            id: Uuid::new_v4(),
            phrase: input.phrase,
        };
        self.session
            .lock()
            .unwrap()
            .insert(question.id, question.clone());
        question
    }

    fn replace(&self, id: Uuid, input: QuestionInput) -> ServiceResult<Question> {
        let mut rows = self.session.lock().unwrap();
        let row = rows.get_mut(&id).ok_or_else(|| Self::missing(id))?;
        row.phrase = input.phrase;
        Ok(row.clone())
    }

    fn remove(&self, id: Uuid) -> ServiceResult<()> {
        self.session
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Self::missing(id))
    }

    fn find(&self, id: Uuid) -> ServiceResult<Question> {
        self.session
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| Self::missing(id))
    }

    fn all(&self) -> Vec<Question> {
        self.session.lock().unwrap().values().cloned().collect()
    }
}

impl GeneralCrudSync<Question, QuestionInput> for QuestionCrud {
    type Session = Store;

    fn from_session(session: Store) -> Self {
        Self { session }
    }

    fn get_objects(&mut self) -> ServiceResult<Vec<Question>> {
        Ok(self.all())
    }

    fn create_object(&mut self, object: QuestionInput) -> ServiceResult<Question> {
        Ok(self.insert(object))
    }

    fn update_object(&mut self, id: Uuid, object: QuestionInput) -> ServiceResult<Question> {
        self.replace(id, object)
    }

    fn delete_object(&mut self, id: Uuid) -> ServiceResult<()> {
        self.remove(id)
    }

    fn get_object_by_id(&mut self, id: Uuid) -> ServiceResult<Question> {
        self.find(id)
    }
}

#[async_trait]
impl GeneralCrudAsync<Question, QuestionInput> for QuestionCrud {
    type Session = Store;

    fn from_session(session: Store) -> Self {
        Self { session }
    }

    async fn get_objects(&mut self) -> ServiceResult<Vec<Question>> {
        Ok(self.all())
    }

    async fn create_object(&mut self, object: QuestionInput) -> ServiceResult<Question> {
        Ok(self.insert(object))
    }

    async fn update_object(&mut self, id: Uuid, object: QuestionInput) -> ServiceResult<Question> {
        self.replace(id, object)
    }

    async fn delete_object(&mut self, id: Uuid) -> ServiceResult<()> {
        self.remove(id)
    }

    async fn get_object_by_id(&mut self, id: Uuid) -> ServiceResult<Question> {
        self.find(id)
    }
}

fn input(phrase: &str) -> QuestionInput {
    QuestionInput {
        phrase: phrase.to_string(),
    }
}

#[test]
fn test_sync_crud_lifecycle() {
    let mut crud = <QuestionCrud as GeneralCrudSync<_, _>>::from_session(Store::default());

    let created = GeneralCrudSync::create_object(&mut crud, input("what is rust")).unwrap();
    let updated =
        GeneralCrudSync::update_object(&mut crud, created.id, input("what is tokio")).unwrap();
    assert_eq!(updated.phrase, "what is tokio");
    assert_eq!(GeneralCrudSync::get_objects(&mut crud).unwrap(), vec![updated.clone()]);

    GeneralCrudSync::delete_object(&mut crud, created.id).unwrap();
    let err = GeneralCrudSync::get_object_by_id(&mut crud, created.id).unwrap_err();
    assert_eq!(err.to_string(), format!("question {} does not exist", created.id));
}

#[tokio::test]
async fn test_async_crud_lifecycle() {
    let store = Store::default();
    let mut crud = <QuestionCrud as GeneralCrudAsync<_, _>>::from_session(store.clone());

    let created = GeneralCrudAsync::create_object(&mut crud, input("hello")).await.unwrap();
    let found = GeneralCrudAsync::get_object_by_id(&mut crud, created.id).await.unwrap();
    assert_eq!(found, created);
    assert_eq!(store.lock().unwrap().len(), 1);

    let missing = Uuid::new_v4();
    assert!(GeneralCrudAsync::update_object(&mut crud, missing, input("x")).await.is_err());
    assert!(GeneralCrudAsync::delete_object(&mut crud, missing).await.is_err());
}
