//! Write pipeline behavior with derived models and ad-hoc callbacks.

use model_validations_derive::{Model, TagValidate};
use model_validations_ports::{Scope, Value};
use model_validations_store::{Callback, Db, Phase, Statement, UPDATE_COLUMN_MARKER};
use serde_json::json;
use std::error::Error;
use std::sync::{Arc, Mutex};

type TestResult = Result<(), Box<dyn Error>>;

#[derive(Debug, Default, TagValidate, Model)]
struct Author {
    id: u64,
    name: String,
    #[model(has_one)]
    profile: Option<Profile>,
    #[model(has_many)]
    posts: Vec<Post>,
}

#[derive(Debug, Default, TagValidate, Model)]
struct Profile {
    id: u64,
    author_id: u64,
    bio: String,
}

#[derive(Debug, Default, TagValidate, Model)]
struct Post {
    id: u64,
    author_id: u64,
    title: String,
}

fn reject_blank(column: &'static str) -> Callback {
    Arc::new(move |statement: &mut Statement<'_>| {
        for model in statement.target.models() {
            if model.row().get(column) == Some(&json!("")) {
                let message = format!("{} has a blank {column}", model.schema().type_name());
                statement.scope.add_error(message.into());
            }
        }
    })
}

fn recorder(seen: &Arc<Mutex<Vec<String>>>) -> Callback {
    let seen = Arc::clone(seen);
    Arc::new(move |statement: &mut Statement<'_>| {
        let entry = format!(
            "{}:{}:{}",
            statement.phase,
            statement.target.shape(),
            statement.scope.flag(UPDATE_COLUMN_MARKER)
        );
        if let Ok(mut seen) = seen.lock() {
            seen.push(entry);
        }
    })
}

#[test]
fn create_persists_record_and_associations() -> TestResult {
    let db = Db::new();
    let author = Author {
        name: "jinzhu".to_string(),
        profile: Some(Profile {
            bio: "gopher".to_string(),
            ..Profile::default()
        }),
        posts: vec![
            Post {
                title: "one".to_string(),
                ..Post::default()
            },
            Post {
                title: "two".to_string(),
                ..Post::default()
            },
        ],
        ..Author::default()
    };

    db.create(&author)?;

    assert_eq!(db.count("authors", "name", &json!("jinzhu"))?, 1);
    assert_eq!(db.rows("profiles")?.len(), 1);
    assert_eq!(db.rows("posts")?.len(), 2);
    Ok(())
}

#[test]
fn callback_error_rolls_back_everything() -> TestResult {
    let db = Db::new();
    db.with_callbacks(|callbacks| callbacks.create().register("reject_blank_title", reject_blank("title")))?;

    let author = Author {
        name: "jinzhu".to_string(),
        posts: vec![Post::default()],
        ..Author::default()
    };
    let Err(error) = db.create(&author) else {
        return Err("blank post title should be rejected".into());
    };

    assert_eq!(error.to_string(), "Post has a blank title");
    assert!(db.rows("authors")?.is_empty());
    assert!(db.rows("posts")?.is_empty());
    Ok(())
}

#[test]
fn errors_join_in_attachment_order() -> TestResult {
    let db = Db::new();
    db.with_callbacks(|callbacks| {
        callbacks.create().register("reject_blank_name", reject_blank("name"));
        callbacks.create().register("reject_blank_name_again", reject_blank("name"));
    })?;

    let Err(error) = db.create(&Author::default()) else {
        return Err("blank name should be rejected".into());
    };
    assert_eq!(
        error.to_string(),
        "Author has a blank name; Author has a blank name"
    );
    assert_eq!(error.errors().len(), 2);
    Ok(())
}

#[test]
fn save_switches_between_create_and_update() -> TestResult {
    let db = Db::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    db.with_callbacks(|callbacks| {
        callbacks.create().register("record", recorder(&seen));
        callbacks.update().register("record", recorder(&seen));
    })?;

    db.save(&Post {
        title: "draft".to_string(),
        ..Post::default()
    })?;
    db.save(&Post {
        id: 1,
        title: "final".to_string(),
        ..Post::default()
    })?;

    assert_eq!(db.count("posts", "title", &json!("final"))?, 1);
    assert_eq!(db.rows("posts")?.len(), 1);
    let seen = seen.lock().map_err(|_| "recorder poisoned")?.clone();
    assert_eq!(seen, vec!["create:single:false", "update:single:false"]);
    Ok(())
}

#[test]
fn update_column_marks_the_operation() -> TestResult {
    let db = Db::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    db.with_callbacks(|callbacks| callbacks.update().register("record", recorder(&seen)))?;

    db.create(&Post {
        title: "draft".to_string(),
        ..Post::default()
    })?;
    let stored = Post {
        id: 1,
        title: "draft".to_string(),
        ..Post::default()
    };
    db.update_column(&stored, "title", "")?;

    assert_eq!(db.count("posts", "title", &json!(""))?, 1);
    let seen = seen.lock().map_err(|_| "recorder poisoned")?.clone();
    assert_eq!(seen, vec!["update:single:true"]);
    Ok(())
}

#[test]
fn raw_rows_reach_callbacks_as_other() -> TestResult {
    let db = Db::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    db.with_callbacks(|callbacks| callbacks.create().register("record", recorder(&seen)))?;

    let row = [("body".to_string(), Value::from("x"))].into_iter().collect();
    db.create_row("notes", row)?;

    assert_eq!(db.rows("notes")?.len(), 1);
    let seen = seen.lock().map_err(|_| "recorder poisoned")?.clone();
    assert_eq!(seen, vec!["create:other:false"]);
    Ok(())
}

#[test]
fn batch_is_one_collection_operation() -> TestResult {
    let db = Db::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    db.with_callbacks(|callbacks| callbacks.create().register("record", recorder(&seen)))?;

    db.create_batch(&[Post::default(), Post::default()])?;

    assert_eq!(db.rows("posts")?.len(), 2);
    let seen = seen.lock().map_err(|_| "recorder poisoned")?.clone();
    assert_eq!(seen, vec!["create:collection:false"]);
    assert_eq!(db.callback_names(Phase::Create)?, vec!["record".to_string()]);
    Ok(())
}

#[test]
fn settings_only_apply_to_the_returned_handle() {
    let db = Db::new();
    let flagged = db.set("audit:skip", true);

    assert_eq!(flagged.settings().get("audit:skip"), Some(&json!(true)));
    assert!(db.settings().is_empty());
}

fn post(id: u64, title: &str) -> Post {
    Post {
        id,
        title: title.to_string(),
        ..Post::default()
    }
}

#[test]
fn associations_receive_the_owner_key() -> TestResult {
    let db = Db::new();
    db.create(&Author {
        name: "first".to_string(),
        ..Author::default()
    })?;
    db.create(&Author {
        name: "second".to_string(),
        profile: Some(Profile {
            bio: "gopher".to_string(),
            ..Profile::default()
        }),
        posts: vec![post(0, "one"), post(0, "two")],
        ..Author::default()
    })?;

    assert_eq!(db.count("profiles", "author_id", &json!(2))?, 1);
    assert_eq!(db.count("posts", "author_id", &json!(2))?, 2);
    assert_eq!(db.count("posts", "author_id", &json!(0))?, 0);
    Ok(())
}

#[test]
fn update_keeps_stored_and_inserts_new_associations() -> TestResult {
    let db = Db::new();
    db.save(&Author {
        name: "jinzhu".to_string(),
        posts: vec![post(0, "rex")],
        ..Author::default()
    })?;

    db.save(&Author {
        id: 1,
        name: "jinzhu".to_string(),
        posts: vec![post(1, "rex"), post(0, "fido")],
        ..Author::default()
    })?;

    let titles: Vec<Value> = db
        .rows("posts")?
        .into_iter()
        .filter_map(|row| row.get("title").cloned())
        .collect();
    assert_eq!(titles, vec![json!("rex"), json!("fido")]);
    assert_eq!(db.count("posts", "author_id", &json!(1))?, 2);
    assert_eq!(db.count("posts", "id", &json!(2))?, 1);
    Ok(())
}

#[test]
fn update_of_an_unsaved_record_is_rejected() -> TestResult {
    let db = Db::new();
    let Err(error) = db.update(&post(0, "draft")) else {
        return Err("update without a key should fail".into());
    };

    assert_eq!(error.to_string(), "cannot update Post without a primary key value");
    assert!(db.rows("posts")?.is_empty());
    Ok(())
}

#[test]
fn callbacks_can_read_through_a_cloned_handle() -> TestResult {
    let db = Db::new();
    let reader = db.clone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let counts = Arc::clone(&seen);
    let callback: Callback = Arc::new(move |_statement: &mut Statement<'_>| {
        if let (Ok(count), Ok(mut counts)) = (reader.count("notes", "body", &json!("x")), counts.lock()) {
            counts.push(count);
        }
    });
    db.with_callbacks(|callbacks| callbacks.create().register("count_notes", callback))?;

    for _ in 0..2 {
        let row = [("body".to_string(), Value::from("x"))].into_iter().collect();
        db.create_row("notes", row)?;
    }

    let seen = seen.lock().map_err(|_| "counter poisoned")?.clone();
    assert_eq!(seen, vec![0, 1]);
    Ok(())
}
