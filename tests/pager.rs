mod common;

use std::time::Duration;

use calendar_purge::pager::Pager;
use common::{FakeCalendar, config};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn advances_and_waits_for_the_page_to_settle() {
    let page = FakeCalendar::new(2);
    let config = config(2);

    let start = Instant::now();
    assert!(Pager::new(&page, &config).advance(1).await);

    assert_eq!(page.current_page(), 2);
    assert_eq!(page.activations(), ["next"]);
    assert!(start.elapsed() >= Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn missing_next_control_reports_false() {
    let page = FakeCalendar::new(2).without_next_control();
    let config = config(2);

    let start = Instant::now();
    assert!(!Pager::new(&page, &config).advance(1).await);

    assert_eq!(page.current_page(), 1);
    assert!(page.activations().is_empty());
    assert!(start.elapsed() >= Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn lookup_failure_reports_false() {
    let page = FakeCalendar::new(2).with_broken_lookups();
    let config = config(2);

    assert!(!Pager::new(&page, &config).advance(1).await);
    assert_eq!(page.lookups(), 1);
}
