use docrepo::collection::{FindOptions, ObjectId};
use docrepo::common::{SortOrder, Value};
use docrepo::doc;
use docrepo::errors::ErrorKind;
use docrepo::repository::{Repository, SaveResult};
use docrepo::repository_config::RepositoryConfig;
use docrepo::store::DocumentStore;
use docrepo_int_test::test_util::{
    cleanup, create_test_context, generate_spam, generate_spams, generate_ticket, is_sorted, run_test, Comment,
    CountingStore, Country, Spam, SpamCount, SpamSummary, Status, Ticket,
};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_save_assigns_identifier() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spam = generate_spam(1);

            let result = repo.save(&mut spam)?;
            assert!(matches!(result, SaveResult::Inserted(_)));

            let id = spam.id.expect("identifier written back");
            assert_eq!(result.created_id(), Some(&Value::ObjectId(id)));

            let stored = ctx.store().find_one("spams", &doc! { "_id": id }, &FindOptions::new())?;
            let stored = stored.expect("stored document");
            assert_eq!(stored.get("_id"), Value::ObjectId(id));
            assert!(!stored.contains_key("id"));
            assert_eq!(stored.get("foo.count"), Value::I32(1));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_save_with_identifier_upserts() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let id = ObjectId::new();
            let mut spam = generate_spam(1);
            spam.id = Some(id);

            match repo.save(&mut spam)? {
                SaveResult::Upserted(result) => {
                    assert_eq!(result.matched_count(), 0);
                    assert_eq!(result.upserted_id(), Some(&Value::ObjectId(id)));
                }
                other => panic!("unexpected {:?}", other),
            }
            assert_eq!(spam.id, Some(id));
            assert_eq!(repo.count(&doc! {})?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_save_twice_updates_in_place() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spam = generate_spam(1);
            repo.save(&mut spam)?;

            spam.foo.count = 42;
            match repo.save(&mut spam)? {
                SaveResult::Upserted(result) => {
                    assert_eq!(result.matched_count(), 1);
                    assert_eq!(result.modified_count(), 1);
                    assert_eq!(result.upserted_id(), None);
                }
                other => panic!("unexpected {:?}", other),
            }

            // saving an unchanged model modifies nothing
            match repo.save(&mut spam)? {
                SaveResult::Upserted(result) => {
                    assert_eq!(result.matched_count(), 1);
                    assert_eq!(result.modified_count(), 0);
                }
                other => panic!("unexpected {:?}", other),
            }

            assert_eq!(repo.count(&doc! {})?, 1);
            let found = repo.find_one_by_id(spam.id.expect("saved"))?;
            assert_eq!(found, Some(spam));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_save_many_writes_back_identifiers_in_order() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;

            let existing_id = ObjectId::new();
            let mut spams = generate_spams(4);
            spams[2].id = Some(existing_id);

            let result = repo.save_many(&mut spams)?;
            assert_eq!(result.inserted_count(), 3);
            assert_eq!(result.upserted_count(), 1);
            assert_eq!(result.upserted_ids().get(&2), Some(&Value::ObjectId(existing_id)));

            for (index, spam) in spams.iter().enumerate() {
                let id = spam.id.expect("every model has an identifier");
                if index == 2 {
                    assert_eq!(id, existing_id);
                } else {
                    assert_eq!(result.inserted_ids().get(&index), Some(&Value::ObjectId(id)));
                }
                assert_eq!(repo.find_one_by_id(id)?.as_ref(), Some(spam));
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_save_many_empty_is_a_no_op() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = CountingStore::new(ctx.store());
            let repo: Repository<Spam, _> = Repository::new(store.clone(), RepositoryConfig::new("spams"))?;
            let mut spams: Vec<Spam> = vec![];

            let result = repo.save_many(&mut spams)?;
            assert!(result.is_empty());
            assert_eq!(store.calls(), 0);
            assert!(ctx.store().collection_names().is_empty());

            let mut one = vec![generate_spam(1)];
            repo.save_many(&mut one)?;
            assert_eq!(store.calls(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_one_by_id_accepts_text_form() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spam = generate_spam(7);
            repo.save(&mut spam)?;
            let id = spam.id.expect("saved");

            assert_eq!(repo.find_one_by_id(id.to_hex())?, Some(spam.clone()));
            assert_eq!(repo.find_one_by_id(id.to_hex().as_str())?, Some(spam));
            assert_eq!(repo.find_one_by_id(ObjectId::new())?, None);

            let err = repo.find_one_by_id("not-an-identifier").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::MalformedIdentifier);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_by_query_and_options() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spams = generate_spams(10);
            repo.save_many(&mut spams)?;

            let found = repo
                .find_by(
                    &doc! { "foo.count": { "$gte": 3 } },
                    &FindOptions::new()
                        .sort_by("foo.count", SortOrder::Descending)
                        .skip(1)
                        .limit(4),
                )?
                .collect_all()?;

            let counts: Vec<i32> = found.iter().map(|spam| spam.foo.count).collect();
            assert_eq!(counts, vec![8, 7, 6, 5]);
            assert!(is_sorted(counts.iter(), false));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_by_translates_id_attribute() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spams = generate_spams(3);
            repo.save_many(&mut spams)?;
            let wanted = spams[1].clone();

            let found = repo.find_one_by(&doc! { id: (wanted.id.expect("saved")) })?;
            assert_eq!(found, Some(wanted));

            let ids: Vec<ObjectId> = repo
                .find_by(&doc! {}, &FindOptions::new().sort_by("id", SortOrder::Descending))?
                .map(|spam| spam.map(|s| s.id.expect("stored")))
                .collect::<Result<_, _>>()?;
            assert!(is_sorted(ids.iter(), false));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_by_with_projection_type() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spam = generate_spam(5);
            repo.save(&mut spam)?;

            let summaries = repo
                .find_by_with_output_type::<SpamSummary>(
                    &doc! {},
                    &FindOptions::new().projection(doc! { name: 1, foo: 1 }),
                )?
                .collect_all()?;

            assert_eq!(
                summaries,
                vec![SpamSummary {
                    id: spam.id,
                    name: spam.name.clone(),
                    foo: spam.foo.clone(),
                }]
            );
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_projection_missing_required_field_fails() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spam = generate_spam(5);
            repo.save(&mut spam)?;

            let mut cursor = repo.find_by(&doc! {}, &FindOptions::new().projection(doc! { name: 1 }))?;
            let err = cursor.first().expect("one document").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::MappingError);
            assert_eq!(err.field(), Some("foo"));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_delete() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spams = generate_spams(3);
            repo.save_many(&mut spams)?;

            assert_eq!(repo.delete(&spams[0])?.deleted_count(), 1);
            assert_eq!(repo.delete(&spams[0])?.deleted_count(), 0);

            let id = spams[1].id.expect("saved");
            assert_eq!(repo.delete_by_id(id.to_hex())?.deleted_count(), 1);

            // a model that was never saved deletes nothing
            assert_eq!(repo.delete(&generate_spam(9))?.deleted_count(), 0);

            assert_eq!(repo.count(&doc! {})?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_text_identifiers() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Ticket>("tickets")?;
            let mut ticket = generate_ticket("broken build", 1);
            ticket.comments.push(Comment {
                id: Some(ObjectId::new().to_hex()),
                author: "alice".to_string(),
                text: "on it".to_string(),
            });
            repo.save(&mut ticket)?;

            let id = ticket.id.clone().expect("identifier written back");
            assert_eq!(id.len(), 24);

            let stored = ctx
                .store()
                .find_one("tickets", &doc! {}, &FindOptions::new())?
                .expect("stored document");
            assert!(stored.get("_id").is_object_id());
            assert!(stored.get("comments.0._id").is_object_id());
            assert_eq!(stored.get("status"), Value::from("Open"));

            assert_eq!(repo.find_one_by_id(id.as_str())?, Some(ticket));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_malformed_text_identifier_is_rejected_on_save() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Ticket>("tickets")?;
            let mut ticket = generate_ticket("broken build", 1);
            ticket.id = Some("xyz".to_string());

            let err = repo.save(&mut ticket).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::MalformedIdentifier);
            assert_eq!(repo.count(&doc! {})?, 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_ignored_field_is_not_stored() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Ticket>("tickets")?;
            let mut ticket = generate_ticket("flaky test", 2);
            ticket.dirty = true;
            ticket.status = Status::InProgress;
            repo.save(&mut ticket)?;

            let stored = ctx
                .store()
                .find_one("tickets", &doc! {}, &FindOptions::new())?
                .expect("stored document");
            assert!(!stored.contains_key("dirty"));

            let found = repo.find_one_by(&doc! { title: "flaky test" })?.expect("found");
            assert!(!found.dirty);
            assert_eq!(found.status, Status::InProgress);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_custom_id_attribute() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Country>("countries")?;
            let mut country = Country {
                code: None,
                name: "Norway".to_string(),
            };
            repo.save(&mut country)?;
            let code = country.code.expect("identifier written back");

            let found = repo.find_one_by(&doc! { code: code })?;
            assert_eq!(found, Some(country));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_custom_identity_key() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo: Repository<Spam, _> = Repository::new(
                ctx.store(),
                RepositoryConfig::new("spams").identity_key("key"),
            )?;
            let mut spam = generate_spam(3);
            repo.save(&mut spam)?;

            let stored = ctx
                .store()
                .find_one("spams", &doc! {}, &FindOptions::new())?
                .expect("stored document");
            assert_eq!(stored.get("key"), Value::ObjectId(spam.id.expect("saved")));
            assert_eq!(repo.find_one_by_id(spam.id.expect("saved"))?, Some(spam));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_invalid_configuration() {
    run_test(
        || create_test_context(),
        |ctx| {
            let err = ctx.repository::<Spam>("my spams").err().expect("invalid name");
            assert_eq!(err.kind(), &ErrorKind::InvalidConfiguration);

            let err = Repository::<Spam, _>::new(ctx.store(), RepositoryConfig::new("spams").identity_key("a.b"))
                .err()
                .expect("invalid identity key");
            assert_eq!(err.kind(), &ErrorKind::InvalidConfiguration);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_aggregate() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spams = generate_spams(6);
            repo.save_many(&mut spams)?;

            let pipeline = vec![
                doc! { "$match": { "foo.count": { "$lt": 4 } } },
                doc! { "$count": "total" },
            ];
            let counts = repo
                .aggregate_with_output_type::<SpamCount>(&pipeline)?
                .collect_all()?;
            assert_eq!(counts, vec![SpamCount { total: 4 }]);

            let raw = repo
                .aggregate(&[doc! { "$sort": { "foo.count": (-1) } }, doc! { "$limit": 1 }])?
                .collect::<Result<Vec<_>, _>>()?;
            assert_eq!(raw.len(), 1);
            assert_eq!(raw[0].get("foo.count"), Value::I32(5));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
