// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Reordering items with subtrees, seen from stores and projections.

use std::cell::Cell;
use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use proptest::prelude::*;
use ordered_views::{
    ChangeEvent, Comparator, Error, IndexedStore, Observable, PositionReorderEngine, Positioned, SortedProjection,
};

#[derive(Debug)]
struct Task {
    title: String,
    position: Cell<usize>,
    children: usize,
}

impl Positioned for Task {
    fn position(&self) -> usize {
        return self.position.get();
    }

    fn set_position(&self, position: usize) {
        self.position.set(position);
    }

    fn subtree_size(&self) -> usize {
        return self.children;
    }
}

fn task(title: &str, position: usize, children: usize) -> Rc<Task> {
    return Rc::new(Task { title: title.to_string(), position: Cell::new(position), children });
}

fn flat_list(len: usize) -> IndexedStore<Task> {
    return IndexedStore::with_items((0..len).map(|i| task(&format!("t{i}"), i, 0))).unwrap();
}

fn titles(store: &IndexedStore<Task>) -> Vec<String> {
    return store.iter().map(|task| task.title.clone()).collect();
}

fn no_persistence() -> impl FnMut(&Rc<Task>) -> Result<(), Infallible> {
    return |_: &Rc<Task>| Ok(());
}

// =============================================================================
// Concrete scenarios
// =============================================================================

#[test]
fn subtree_moves_to_front() {
    let mut store = flat_list(6);
    let parent = task("parent", 6, 3);
    store.push(parent.clone()).unwrap();
    for (i, title) in ["a", "b", "c"].iter().enumerate() {
        store.push(task(title, 7 + i, 0)).unwrap();
    }

    let events = Rc::new(RefCell::new(Vec::new()));
    let log = events.clone();
    store.subscribe(move |_, event| log.borrow_mut().push(event));

    let mut engine = PositionReorderEngine::new(no_persistence());
    let report = engine.move_item(&mut store, &parent, 0).unwrap();

    assert_eq!(
        titles(&store),
        vec!["parent", "a", "b", "c", "t0", "t1", "t2", "t3", "t4", "t5"]
    );
    for (index, task) in store.iter().enumerate() {
        assert_eq!(task.position(), index);
    }
    assert_eq!(*events.borrow(), vec![ChangeEvent::new(6, 4, 0), ChangeEvent::new(0, 0, 4)]);
    assert_eq!(report.plan.events().to_vec(), *events.borrow());
}

#[test]
fn long_move_relocates_the_subtree_only() {
    let mut store = flat_list(100);
    let item = store.get(10).unwrap().clone();

    let events = Rc::new(RefCell::new(Vec::new()));
    let log = events.clone();
    store.subscribe(move |_, event| log.borrow_mut().push(event));

    let mut engine = PositionReorderEngine::new(no_persistence());
    engine.move_item(&mut store, &item, 90).unwrap();

    assert_eq!(store.index_of(&item), Some(90));
    assert_eq!(*events.borrow(), vec![ChangeEvent::removed(10, 1), ChangeEvent::inserted(90, 1)]);
}

#[test]
fn short_hop_relocates_the_neighbours() {
    let mut store = flat_list(3);
    let parent = task("parent", 3, 4);
    store.push(parent.clone()).unwrap();
    for i in 0..4 {
        store.push(task(&format!("child{i}"), 4 + i, 0)).unwrap();
    }

    let events = Rc::new(RefCell::new(Vec::new()));
    let log = events.clone();
    store.subscribe(move |_, event| log.borrow_mut().push(event));

    let mut engine = PositionReorderEngine::new(no_persistence());
    engine.move_item(&mut store, &parent, 2).unwrap();

    assert_eq!(titles(&store)[2..4], ["parent".to_string(), "child0".to_string()]);
    assert_eq!(titles(&store)[7], "t2");
    assert_eq!(*events.borrow(), vec![ChangeEvent::removed(2, 1), ChangeEvent::inserted(7, 1)]);
}

#[test]
fn destination_inside_subtree_is_rejected() {
    let mut store = flat_list(2);
    let parent = task("parent", 2, 2);
    store.push(parent.clone()).unwrap();
    store.push(task("x", 3, 0)).unwrap();
    store.push(task("y", 4, 0)).unwrap();

    let persisted = Rc::new(Cell::new(0));
    let count = persisted.clone();
    let mut engine = PositionReorderEngine::new(move |_: &Rc<Task>| {
        count.set(count.get() + 1);
        return Ok::<(), Infallible>(());
    });

    let error = engine.move_item(&mut store, &parent, 4).unwrap_err();
    assert_eq!(error, Error::InvalidDestination { destination: 4, start: 2, end: 5 });
    assert_eq!(engine.move_item(&mut store, &parent, 5).unwrap_err(), Error::OutOfRange { index: 5, len: 5 });
    assert_eq!(persisted.get(), 0);
    assert_eq!(titles(&store), vec!["t0", "t1", "parent", "x", "y"]);
}

#[test]
fn projections_follow_a_reorder() {
    let store = Rc::new(RefCell::new(flat_list(8)));
    let by_title = SortedProjection::observe(
        &Rc::downgrade(&store),
        Comparator::by_key(|task: &Task| task.title.clone()),
    )
    .unwrap();
    let mirror = SortedProjection::observe(&Rc::downgrade(&store), Comparator::unsorted()).unwrap();

    let item = store.borrow().get(1).unwrap().clone();
    let mut engine = PositionReorderEngine::new(no_persistence());
    engine.move_item(&mut store.borrow_mut(), &item, 6).unwrap();

    let expected = titles(&store.borrow());
    let mirrored: Vec<String> = mirror.borrow().iter().map(|task| task.title.clone()).collect();
    assert_eq!(mirrored, expected);

    let sorted: Vec<String> = by_title.borrow().iter().map(|task| task.title.clone()).collect();
    assert_eq!(sorted, vec!["t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7"]);
}

// =============================================================================
// Round trips
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Moving a block away and back restores every position
    #[test]
    fn move_and_back_restores_positions(
        len in 2usize..80,
        start_pct in 0.0..1.0f64,
        subtree_pct in 0.0..1.0f64,
        destination_pct in 0.0..1.0f64,
    ) {
        let start = ((start_pct * len as f64) as usize).min(len - 1);
        let children = (subtree_pct * (len - start - 1) as f64) as usize;
        let block_end = start + children + 1;
        prop_assume!(block_end < len || start > 0);

        // Pick a destination outside the block.
        let outside = len - (children + 1);
        let mut destination = ((destination_pct * outside as f64) as usize).min(outside - 1);
        if destination >= start {
            destination += children + 1;
        }

        let items: Vec<Rc<Task>> = (0..len)
            .map(|i| task(&format!("t{i}"), i, if i == start { children } else { 0 }))
            .collect();
        let mut store = IndexedStore::with_items(items.iter().cloned()).unwrap();
        let before = titles(&store);

        let mut engine = PositionReorderEngine::new(no_persistence());
        let report = engine.move_item(&mut store, &items[start], destination).unwrap();
        prop_assert_eq!(store.index_of(&items[start]), Some(report.plan.final_start()));
        for (index, task) in store.iter().enumerate() {
            prop_assert_eq!(task.position(), index);
        }

        let [removed, inserted] = report.plan.events();
        let smaller = (children + 1).min(report.plan.displaced().len());
        prop_assert_eq!(removed.removed, smaller);
        prop_assert_eq!(inserted.added, smaller);

        engine.move_item(&mut store, &items[start], report.plan.inverse_destination()).unwrap();
        prop_assert_eq!(titles(&store), before);
        for (index, task) in store.iter().enumerate() {
            prop_assert_eq!(task.position(), index);
        }
    }
}
