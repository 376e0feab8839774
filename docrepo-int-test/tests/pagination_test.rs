use docrepo::collection::{FindOptions, ObjectId};
use docrepo::common::{SortOrder, SortSpec};
use docrepo::doc;
use docrepo::errors::{ErrorKind, RepoResult};
use docrepo::pagination::{CursorToken, PageRequest};
use docrepo::repository::{Model, Repository};
use docrepo::store::memory::MemoryStore;
use docrepo_int_test::test_util::{
    cleanup, create_test_context, generate_event, generate_spams, generate_ticket, is_sorted, run_test, Event, Spam,
    SpamSummary, Status, Ticket,
};

// follows `after` cursors until an empty page
fn page_through<M: Model>(repo: &Repository<M, MemoryStore>, request: &PageRequest) -> RepoResult<Vec<M>> {
    let mut paged = vec![];
    let mut next = request.clone();
    loop {
        let edges = repo.paginate(&next)?;
        let Some(last) = edges.last() else {
            break;
        };
        next = request.clone().after(last.cursor());
        paged.extend(edges.into_iter().map(|edge| edge.into_node()));
    }
    Ok(paged)
}

#[test]
fn test_exhaustive_pagination_by_identifier() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spams = generate_spams(7);
            repo.save_many(&mut spams)?;

            let mut seen: Vec<ObjectId> = vec![];
            let mut request = PageRequest::new(1);
            loop {
                let edges = repo.paginate(&request)?;
                assert!(edges.len() <= 1);
                let Some(last) = edges.last() else {
                    break;
                };
                seen.push(last.node().id.expect("stored"));
                request = PageRequest::new(1).after(last.cursor());
            }

            let mut expected: Vec<ObjectId> = spams.iter().filter_map(|spam| spam.id).collect();
            expected.sort();
            assert_eq!(seen, expected);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_pages_concatenate_to_sorted_query() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spams = generate_spams(10);
            repo.save_many(&mut spams)?;

            let query = doc! { "foo.count": { "$ne": 4 } };
            let mut request = PageRequest::new(3)
                .query(query.clone())
                .sort_by("foo.count", SortOrder::Descending);

            let mut paged = vec![];
            let mut pages = 0;
            loop {
                let edges = repo.paginate(&request)?;
                if edges.is_empty() {
                    break;
                }
                pages += 1;
                let cursor = edges[edges.len() - 1].cursor().to_string();
                paged.extend(edges.into_iter().map(|edge| edge.into_node()));
                request = request.after(&cursor);
            }

            let expected = repo
                .find_by(&query, &FindOptions::new().sort_by("foo.count", SortOrder::Descending))?
                .collect_all()?;
            assert_eq!(pages, 3);
            assert_eq!(paged, expected);
            assert!(is_sorted(paged.iter().map(|spam| spam.foo.count), false));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_pagination_with_ties_on_compound_sort() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Ticket>("tickets")?;
            let mut tickets: Vec<Ticket> = (0..9)
                .map(|i| {
                    let mut ticket = generate_ticket(&format!("ticket {}", i), i % 3);
                    ticket.status = if i % 2 == 0 { Status::Open } else { Status::Closed };
                    ticket
                })
                .collect();
            repo.save_many(&mut tickets)?;

            let sort = SortSpec::new()
                .add_sorted_field("priority", SortOrder::Descending)
                .add_sorted_field("status", SortOrder::Ascending)
                .add_sorted_field("id", SortOrder::Ascending);

            let mut paged: Vec<Ticket> = vec![];
            let mut after: Option<String> = None;
            loop {
                let mut request = PageRequest::new(2).sort(sort.clone());
                if let Some(cursor) = &after {
                    request = request.after(cursor);
                }
                let edges = repo.paginate(&request)?;
                match edges.last() {
                    Some(last) => after = Some(last.cursor().to_string()),
                    None => break,
                }
                paged.extend(edges.into_iter().map(|edge| edge.into_node()));
            }

            let expected = repo.find_by(&doc! {}, &FindOptions::new().sort(sort))?.collect_all()?;
            assert_eq!(paged.len(), 9);
            assert_eq!(paged, expected);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_pagination_across_null_sort_values() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spams = generate_spams(6);
            for (spam, size) in spams.iter_mut().zip([None, Some(2.0), None, Some(1.0), None, Some(2.0)]) {
                spam.foo.size = size;
            }
            repo.save_many(&mut spams)?;

            for order in [SortOrder::Ascending, SortOrder::Descending] {
                let sort = SortSpec::by("foo.size", order).add_sorted_field("id", SortOrder::Ascending);
                let expected = repo
                    .find_by(&doc! {}, &FindOptions::new().sort(sort.clone()))?
                    .collect_all()?;

                for limit in [1, 2, 4] {
                    let paged = page_through(&repo, &PageRequest::new(limit).sort(sort.clone()))?;
                    assert_eq!(paged.len(), 6, "{:?} limit {}", order, limit);
                    assert_eq!(paged, expected, "{:?} limit {}", order, limit);
                }
            }

            let ascending = SortSpec::by("foo.size", SortOrder::Ascending).add_sorted_field("id", SortOrder::Ascending);
            let sizes: Vec<Option<f64>> = page_through(&repo, &PageRequest::new(1).sort(ascending))?
                .iter()
                .map(|spam| spam.foo.size)
                .collect();
            assert_eq!(sizes, vec![None, None, None, Some(1.0), Some(2.0), Some(2.0)]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_before_cursor_across_null_sort_values() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spams = generate_spams(4);
            spams[0].foo.size = None;
            spams[1].foo.size = None;
            spams[2].foo.size = Some(5.0);
            spams[3].foo.size = Some(7.0);
            repo.save_many(&mut spams)?;

            let request = PageRequest::new(10).sort_by("foo.size", SortOrder::Descending);
            let edges = repo.paginate(&request)?;
            assert_eq!(edges.len(), 4);

            let before_last = repo.paginate(&request.clone().before(edges[3].cursor()))?;
            let sizes: Vec<Option<f64>> = before_last.iter().map(|edge| edge.node().foo.size).collect();
            assert_eq!(sizes, vec![Some(7.0), Some(5.0)]);

            let ascending = PageRequest::new(10).sort_by("foo.size", SortOrder::Ascending);
            let edges = repo.paginate(&ascending)?;
            assert!(repo.paginate(&ascending.clone().before(edges[0].cursor()))?.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_pagination_by_timestamp() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Event>("events")?;
            let mut events: Vec<Event> = [30, 10, 20, 10, 40, 0, 20].into_iter().map(generate_event).collect();
            repo.save_many(&mut events)?;

            let sort = SortSpec::by("happened_at", SortOrder::Descending).add_sorted_field("id", SortOrder::Ascending);
            let paged = page_through(&repo, &PageRequest::new(2).sort(sort.clone()))?;
            let expected = repo.find_by(&doc! {}, &FindOptions::new().sort(sort))?.collect_all()?;

            assert_eq!(paged.len(), 7);
            assert_eq!(paged, expected);
            assert!(is_sorted(paged.iter().map(|event| event.happened_at), false));

            let first = repo.paginate(&PageRequest::new(1).sort_by("happened_at", SortOrder::Ascending))?;
            let cursor = first[0].cursor();
            let rest = repo.paginate(
                &PageRequest::new(10)
                    .sort_by("happened_at", SortOrder::Ascending)
                    .after(cursor),
            )?;
            assert_eq!(rest.len(), 6);
            assert!(rest
                .iter()
                .all(|edge| edge.node().happened_at > first[0].node().happened_at));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_last_cursor_yields_empty_page() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spams = generate_spams(3);
            repo.save_many(&mut spams)?;

            let edges = repo.paginate(&PageRequest::new(10))?;
            assert_eq!(edges.len(), 3);

            let last = edges[2].cursor();
            assert!(repo.paginate(&PageRequest::new(10).after(last))?.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_cursor_survives_deleted_document() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spams = generate_spams(5);
            repo.save_many(&mut spams)?;

            let request = PageRequest::new(2).sort_by("foo.count", SortOrder::Ascending);
            let first = repo.paginate(&request)?;
            let (node, cursor) = first[1].clone().into_parts();
            assert_eq!(node.foo.count, 1);
            repo.delete(&node)?;

            let next = repo.paginate(&request.clone().after(&cursor))?;
            let counts: Vec<i32> = next.iter().map(|edge| edge.node().foo.count).collect();
            assert_eq!(counts, vec![2, 3]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_before_cursor() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spams = generate_spams(10);
            repo.save_many(&mut spams)?;

            let request = PageRequest::new(10).sort_by("foo.count", SortOrder::Ascending);
            let edges = repo.paginate(&request)?;
            let cursor = edges[5].cursor();

            let before = repo.paginate(&PageRequest::new(3).sort_by("foo.count", SortOrder::Ascending).before(cursor))?;
            let counts: Vec<i32> = before.iter().map(|edge| edge.node().foo.count).collect();
            assert_eq!(counts, vec![0, 1, 2]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_paginate_with_projection_type() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spams = generate_spams(4);
            repo.save_many(&mut spams)?;

            let request = PageRequest::new(2)
                .sort_by("foo.count", SortOrder::Ascending)
                .projection(doc! { name: 1, foo: 1 });
            let first = repo.paginate_with_output_type::<SpamSummary>(&request)?;
            assert_eq!(first.len(), 2);
            assert_eq!(first[0].node().name, spams[0].name);
            assert_eq!(first[0].node().id, spams[0].id);

            let second = repo.paginate_with_output_type::<SpamSummary>(&request.clone().after(first[1].cursor()))?;
            let counts: Vec<i32> = second.iter().map(|edge| edge.node().foo.count).collect();
            assert_eq!(counts, vec![2, 3]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_cursor_from_other_sort_is_rejected() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let mut spams = generate_spams(3);
            repo.save_many(&mut spams)?;

            let edges = repo.paginate(&PageRequest::new(1))?;
            let err = repo
                .paginate(
                    &PageRequest::new(1)
                        .sort_by("foo.count", SortOrder::Ascending)
                        .after(edges[0].cursor()),
                )
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidCursor);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_malformed_cursor_is_rejected() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            for cursor in ["", "not a cursor", "eJyrVkrLz1eyUkpKLFKqBQAdegQ0"] {
                let err = repo.paginate(&PageRequest::new(1).after(cursor)).unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::InvalidCursor, "{}", cursor);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_invalid_page_requests() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repo = ctx.repository::<Spam>("spams")?;
            let err = repo.paginate(&PageRequest::new(0)).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);

            let cursor = CursorToken::new(SortSpec::by("_id", SortOrder::Ascending), vec![ObjectId::new().into()])
                .encode()?;
            let err = repo
                .paginate(&PageRequest::new(1).after(&cursor).before(&cursor))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
