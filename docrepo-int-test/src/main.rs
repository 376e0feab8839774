use docrepo::common::SortOrder;
use docrepo::doc;
use docrepo::errors::RepoResult;
use docrepo::pagination::PageRequest;
use docrepo_derive::{Convertible, Entity};
use docrepo_int_test::test_util::{cleanup, create_test_context};

#[derive(Debug, Clone, Default, Convertible, Entity)]
pub struct StressRecord {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub processed: Option<bool>,
    pub sequence: i64,
}

fn main() -> RepoResult<()> {
    println!("Starting stress test...");
    let ctx = create_test_context()?;

    let count = 100_000;
    let repo = ctx.repository::<StressRecord>("stress_records")?;

    let start = std::time::Instant::now();
    let mut records: Vec<StressRecord> = (0..count)
        .map(|sequence| StressRecord {
            first_name: Some(format!("name-{}", sequence)),
            processed: Some(false),
            sequence,
            ..Default::default()
        })
        .collect();
    repo.save_many(&mut records)?;
    println!("Inserted {} records in {:?}", count, start.elapsed());

    let start = std::time::Instant::now();
    let mut pages = 0;
    let mut seen = 0;
    let mut request = PageRequest::new(1000).sort_by("sequence", SortOrder::Ascending);
    loop {
        let edges = repo.paginate(&request)?;
        let Some(last) = edges.last() else {
            break;
        };
        request = request.after(last.cursor());
        pages += 1;
        seen += edges.len();
    }
    println!("Paged through {} records in {} pages in {:?}", seen, pages, start.elapsed());

    let start = std::time::Instant::now();
    for record in records.iter_mut().take(10_000) {
        record.processed = Some(true);
        repo.save(record)?;
    }
    println!("Saved 10000 updated records in {:?}", start.elapsed());

    let start = std::time::Instant::now();
    let processed = repo.count(&doc! { processed: true })?;
    println!("Counted {} processed records in {:?}", processed, start.elapsed());

    cleanup(ctx)
}
