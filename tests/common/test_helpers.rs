use std::sync::Arc;

use serde_json::json;
use validate_json::{
    ArrayRule, BoolRule, DoubleRule, IntRule, Schema, StringRule, ValidationConfig,
    ValidationEngine, Value,
};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Friend {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Item {
    pub id: String,
    pub index: i64,
    pub guid: String,
    pub is_active: bool,
    pub balance: String,
    pub picture: String,
    pub age: i64,
    pub eye_color: String,
    pub name: String,
    pub gender: String,
    pub company: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tags: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub friends: Vec<Friend>,
}

/// Engine with a pool of `workers` threads and no timeout
pub fn engine(workers: usize) -> ValidationEngine {
    ValidationEngine::new(ValidationConfig::default().with_workers(workers)).unwrap()
}

pub fn friend_schema() -> Arc<Schema<Friend>> {
    Arc::new(
        Schema::builder(Friend::default)
            .expect("id", IntRule, |f: &mut Friend, v| f.id = v)
            .expect("name", StringRule, |f: &mut Friend, v| f.name = v)
            .build()
            .unwrap(),
    )
}

/// Item schema whose `friends` field is a concurrent array of friend objects
pub fn item_schema(engine: &ValidationEngine) -> Arc<Schema<Item>> {
    item_schema_with(engine, Item::default)
}

pub fn item_schema_with<F>(engine: &ValidationEngine, factory: F) -> Arc<Schema<Item>>
where
    F: Fn() -> Item + Send + Sync + 'static,
{
    let friends = engine.array_rule(engine.class_rule(friend_schema()));
    Arc::new(
        Schema::builder(factory)
            .required("_id", StringRule, |id: &String| !id.is_empty())
            .expect("_id", StringRule, |i: &mut Item, v| i.id = v)
            .expect("index", IntRule, |i: &mut Item, v| i.index = v)
            .expect("guid", StringRule, |i: &mut Item, v| i.guid = v)
            .expect("isActive", BoolRule, |i: &mut Item, v| i.is_active = v)
            .expect("balance", StringRule, |i: &mut Item, v| i.balance = v)
            .expect("picture", StringRule, |i: &mut Item, v| i.picture = v)
            .expect("age", IntRule, |i: &mut Item, v| i.age = v)
            .expect("eyeColor", StringRule, |i: &mut Item, v| i.eye_color = v)
            .expect("name", StringRule, |i: &mut Item, v| i.name = v)
            .expect("gender", StringRule, |i: &mut Item, v| i.gender = v)
            .expect("company", StringRule, |i: &mut Item, v| i.company = v)
            .optional("email", StringRule, |i: &mut Item, v| i.email = Some(v))
            .optional("phone", StringRule, |i: &mut Item, v| i.phone = Some(v))
            .expect("tags", ArrayRule::new(StringRule), |i: &mut Item, v| {
                i.tags = v
            })
            .optional_or("latitude", DoubleRule, 0.0, |i: &mut Item, v| {
                i.latitude = v
            })
            .optional_or("longitude", DoubleRule, 0.0, |i: &mut Item, v| {
                i.longitude = v
            })
            .optional("friends", friends, |i: &mut Item, v| i.friends = v)
            .build()
            .unwrap(),
    )
}

/// A valid item record; every tenth one omits its optional fields
pub fn sample_item(index: usize) -> Value {
    let gender = if index % 2 == 0 { "female" } else { "male" };
    let mut item = json!({
        "_id": format!("5a1f{:08x}", index),
        "index": index,
        "guid": format!("guid-{}", index),
        "isActive": index % 2 == 0,
        "balance": format!("${}.{:02}", 1000 + index, index % 100),
        "picture": "http://placehold.it/32x32",
        "age": 20 + (index % 40),
        "eyeColor": "brown",
        "name": format!("Person {}", index),
        "gender": gender,
        "company": "ACME",
        "tags": ["alpha", "beta", format!("tag-{}", index % 7)],
    });

    if index % 10 != 0 {
        let fields = item.as_object_mut().unwrap();
        fields.insert("email".into(), json!(format!("person{}@acme.test", index)));
        fields.insert("phone".into(), json!("+1 (800) 555-0100"));
        fields.insert("latitude".into(), json!(index as f64 / 10.0 + 0.5));
        fields.insert("longitude".into(), json!(-(index as f64) / 10.0 - 0.25));
        fields.insert(
            "friends".into(),
            json!([
                {"id": 0, "name": "Ann"},
                {"id": 1, "name": format!("Friend of {}", index)},
            ]),
        );
    }

    item
}

/// Array of `count` valid items
pub fn sample_items(count: usize) -> Value {
    Value::Array((0..count).map(sample_item).collect())
}
