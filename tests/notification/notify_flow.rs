use std::sync::Arc;
use std::thread;

use space_notify::ordinal::OrdinalSource;
use space_notify::DeliveryPolicy;
use space_notify::DispatchConfig;
use space_notify::EntryTransition;
use space_notify::InterestFn;
use space_notify::KindFilter;
use space_notify::RemovalCause;
use space_notify::TransitionDispatcher;
use space_notify::TransitionKind;
use space_notify::Watcher;

use crate::common::RemovalLog;
use crate::common::Space;
use crate::common::Tuple;

fn notified(
    dispatcher: &TransitionDispatcher<Tuple>,
    transition: &EntryTransition<Tuple>,
) -> Vec<u64> {
    dispatcher
        .matches_for(transition, transition.ordinal())
        .unwrap()
        .iter()
        .map(|w| w.ordinal())
        .collect()
}

#[test]
fn test_write_and_take_notify_matching_watchers() {
    let dispatcher = TransitionDispatcher::new(DispatchConfig::default());
    let space = Space::default();
    let ids = OrdinalSource::new();

    let any_task = Watcher::builder(ids.next()).interest(KindFilter::arrivals()).build();
    let urgent_task = Watcher::builder(ids.next()).build();
    let departures = Watcher::builder(ids.next())
        .interest(KindFilter::new([TransitionKind::Departure]))
        .build();

    dispatcher.register(&any_task, Arc::new(Tuple::new("Task", &[None, None]))).unwrap();
    dispatcher
        .register(&urgent_task, Arc::new(Tuple::new("Task", &[Some("urgent"), None])))
        .unwrap();
    dispatcher.register(&departures, Arc::new(Tuple::any())).unwrap();

    let routine = space.write(Tuple::new("Task", &[Some("routine"), Some("build")]));
    assert_eq!(notified(&dispatcher, &routine), vec![1]);

    let urgent = space.write(Tuple::new("Task", &[Some("urgent"), Some("deploy")]));
    assert_eq!(notified(&dispatcher, &urgent), vec![1, 2]);

    let taken = space.take(&urgent).expect("entry present");
    assert_eq!(notified(&dispatcher, &taken), vec![2, 3]);
    assert!(space.take(&urgent).is_none());
    assert_eq!(space.len(), 1);
}

#[test]
fn test_supertype_registration_sees_subtypes() {
    let dispatcher = TransitionDispatcher::new(DispatchConfig::default());
    let space = Space::default();

    let on_event = Watcher::builder(1).build();
    dispatcher.register(&on_event, Arc::new(Tuple::new("Event", &[]))).unwrap();

    let alert = space.write(Tuple::new("Alert", &[Some("disk")]).extends(&["Event"]));
    assert_eq!(notified(&dispatcher, &alert), vec![1]);

    let notice = space.write(Tuple::new("Notice", &[Some("disk")]));
    assert!(notified(&dispatcher, &notice).is_empty());
}

#[test]
fn test_one_shot_read_and_repeat_notify() {
    let dispatcher = TransitionDispatcher::new(DispatchConfig::default());
    let space = Space::default();
    let removals = RemovalLog::default();

    let read = Watcher::builder(1)
        .policy(DeliveryPolicy::OneShot)
        .on_removed(removals.recorder())
        .build();
    let notify = Watcher::builder(2).on_removed(removals.recorder()).build();
    dispatcher.register(&read, Arc::new(Tuple::new("Job", &[]))).unwrap();
    dispatcher.register(&notify, Arc::new(Tuple::new("Job", &[]))).unwrap();

    let first = space.write(Tuple::new("Job", &[Some("a")]));
    assert_eq!(notified(&dispatcher, &first), vec![1, 2]);

    let second = space.write(Tuple::new("Job", &[Some("b")]));
    assert_eq!(notified(&dispatcher, &second), vec![2]);

    assert!(dispatcher.cancel(&notify));
    let third = space.write(Tuple::new("Job", &[Some("c")]));
    assert!(notified(&dispatcher, &third).is_empty());

    assert_eq!(
        removals.events(),
        vec![(1, RemovalCause::Delivered), (2, RemovalCause::Cancelled)]
    );
}

#[test]
fn test_interest_fn_sees_ordinals() {
    let dispatcher = TransitionDispatcher::new(DispatchConfig::default());
    let space = Space::default();

    let after_third = Watcher::builder(1)
        .interest(InterestFn(|_: &EntryTransition<Tuple>, ordinal: u64| ordinal > 3))
        .build();
    dispatcher.register(&after_third, Arc::new(Tuple::any())).unwrap();

    let matched: Vec<usize> = (0..5)
        .map(|i| {
            let transition = space.write(Tuple::new("Job", &[Some(i.to_string().as_str())]));
            notified(&dispatcher, &transition).len()
        })
        .collect();
    assert_eq!(matched, vec![0, 0, 0, 1, 1]);
}

#[test]
fn test_parallel_writers_notify_every_watcher_once_per_write() {
    let dispatcher = Arc::new(TransitionDispatcher::new(DispatchConfig::default()));
    let space = Arc::new(Space::default());

    let watchers: Vec<_> = (1..=16)
        .map(|ordinal| {
            let w = Watcher::builder(ordinal).build();
            let template = if ordinal % 2 == 0 {
                Tuple::any()
            } else {
                Tuple::new("Job", &[None])
            };
            dispatcher.register(&w, Arc::new(template)).unwrap();
            w
        })
        .collect();

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let dispatcher = Arc::clone(&dispatcher);
            let space = Arc::clone(&space);
            thread::spawn(move || {
                let mut total = 0;
                for i in 0..50 {
                    let transition = space.write(Tuple::new("Job", &[Some(format!("{t}-{i}").as_str())]));
                    let found = notified(&dispatcher, &transition);
                    assert_eq!(found, (1..=16).collect::<Vec<u64>>());
                    total += found.len();
                }
                total
            })
        })
        .collect();

    let total: usize = writers.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, 4 * 50 * watchers.len());
    assert_eq!(dispatcher.last_ordinal(), 200);
}
