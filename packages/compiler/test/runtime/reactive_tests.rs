use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use twinrender_compiler::path::{Path, PathSegment};
use twinrender_compiler::runtime::{
    getter, setter, BoundView, Key, ReactiveState, RuntimeMapping, Slot, MAX_ARRAY_LENGTH,
};
use twinrender_compiler::RuntimeError;

type Log = Rc<RefCell<Vec<String>>>;

fn path(names: &[&str]) -> Path {
    Path::from_properties(names).unwrap()
}

fn element_of(names: &[&str]) -> Path {
    let mut segments: Vec<PathSegment> = names.iter().map(|n| PathSegment::property(*n)).collect();
    segments.push(PathSegment::marker("x", 0));
    Path::from_segments(segments).unwrap()
}

fn logging_setter(log: &Log, label: &'static str) -> twinrender_compiler::runtime::Setter {
    let log = log.clone();
    setter(move |_state, value, indices| {
        log.borrow_mut()
            .push(format!("{}:{}:{:?}", label, value, indices));
    })
}

fn view(slot: Option<Slot>) -> twinrender_compiler::runtime::ViewId {
    slot.and_then(|s| s.as_view()).expect("a nested view")
}

fn value(slot: Option<Slot>) -> Value {
    match slot {
        Some(Slot::Value(value)) => value,
        other => panic!("expected a value, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_read_out_of_bounds_index_as_none() {
        let mut mapping = RuntimeMapping::new();
        mapping.ensure_path(&element_of(&["items"])).unwrap();

        let mut state = ReactiveState::new(&mapping, json!({"items": [1, 2, 3]})).unwrap();
        let root = state.root();
        let items = view(state.get(root, "items").unwrap());
        assert_eq!(state.get_index(items, 5).unwrap(), None);
        assert_eq!(value(state.get_index(items, 1).unwrap()), json!(2));
        assert_eq!(state.len(items), 3);
    }

    #[test]
    fn should_return_the_same_view_for_repeated_reads() {
        let mut mapping = RuntimeMapping::new();
        mapping.ensure_path(&path(&["user", "name"])).unwrap();

        let mut state = ReactiveState::new(&mapping, json!({"user": {"name": "Ann"}})).unwrap();
        let root = state.root();
        let first = view(state.get(root, "user").unwrap());
        let second = view(state.get(root, "user").unwrap());
        assert_eq!(first, second);

        state.set(root, "user", json!({"name": "Bo"})).unwrap();
        assert_eq!(view(state.get(root, "user").unwrap()), first);
        assert_eq!(value(state.get(first, "name").unwrap()), json!("Bo"));
    }

    #[test]
    fn should_run_setters_in_registration_order() {
        let log: Log = Rc::default();
        let mut mapping = RuntimeMapping::new();
        let title = mapping.ensure_path(&path(&["title"])).unwrap();
        title.attach_set(logging_setter(&log, "attribute"));
        title.attach_set(logging_setter(&log, "text"));

        let mut state = ReactiveState::new(&mapping, json!({})).unwrap();
        let root = state.root();
        state.set(root, "title", json!("x")).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["attribute:\"x\":[]".to_string(), "text:\"x\":[]".to_string()]
        );
        assert_eq!(value(state.get(root, "title").unwrap()), json!("x"));
    }

    #[test]
    fn should_memoize_values_read_from_rendered_output() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut mapping = RuntimeMapping::new();
        mapping
            .ensure_path(&path(&["title"]))
            .unwrap()
            .attach_get(getter(move |_state, _indices| {
                counter.set(counter.get() + 1);
                json!("rendered")
            }));

        let mut state = ReactiveState::new(&mapping, json!({})).unwrap();
        let root = state.root();
        assert_eq!(value(state.get(root, "title").unwrap()), json!("rendered"));
        assert_eq!(value(state.get(root, "title").unwrap()), json!("rendered"));
        assert_eq!(calls.get(), 1);

        state.set(root, "title", json!("written")).unwrap();
        assert_eq!(value(state.get(root, "title").unwrap()), json!("written"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn should_ignore_unmapped_keys() {
        let mut mapping = RuntimeMapping::new();
        mapping.ensure_path(&path(&["title"])).unwrap();

        let mut state = ReactiveState::new(&mapping, json!({"title": "a"})).unwrap();
        let root = state.root();
        assert_eq!(state.get(root, "missing").unwrap(), None);
        state.set(root, "missing", json!(1)).unwrap();
        assert_eq!(state.to_json(root), json!({"title": "a"}));
        assert_eq!(state.keys(root), vec!["title".to_string()]);
        assert!(state.has(root, "title"));
        assert!(!state.has(root, "missing"));
    }

    #[test]
    fn should_push_after_storing_appended_element() {
        let seen: Log = Rc::default();
        let sink = seen.clone();
        let mut mapping = RuntimeMapping::new();
        mapping.ensure_path(&element_of(&["items"])).unwrap();
        mapping.ensure_path(&path(&["items"])).unwrap().push = Some(setter(
            move |state, value, indices| {
                let root = state.root();
                let items = state
                    .get(root, "items")
                    .ok()
                    .flatten()
                    .and_then(|slot| slot.as_view());
                let stored = items.and_then(|items| state.get_index(items, indices[0]).ok().flatten());
                sink.borrow_mut()
                    .push(format!("{} {:?} {:?}", value, indices, stored));
            },
        ));

        let mut state = ReactiveState::new(&mapping, json!({"items": [1, 2, 3]})).unwrap();
        let root = state.root();
        let items = view(state.get(root, "items").unwrap());
        state.set_index(items, 3, json!(4)).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec!["4 [3] Some(Value(Number(4)))".to_string()]
        );
        assert_eq!(state.to_json(root), json!({"items": [1, 2, 3, 4]}));
    }

    #[test]
    fn should_run_element_setters_below_length() {
        let log: Log = Rc::default();
        let mut mapping = RuntimeMapping::new();
        mapping
            .ensure_path(&element_of(&["items"]))
            .unwrap()
            .attach_set(logging_setter(&log, "item"));

        let mut state = ReactiveState::new(&mapping, json!({"items": ["a", "b"]})).unwrap();
        let root = state.root();
        let items = view(state.get(root, "items").unwrap());
        state.set_index(items, 1, json!("c")).unwrap();

        assert_eq!(*log.borrow(), vec!["item:\"c\":[1]".to_string()]);
        assert_eq!(state.to_json(items), json!(["a", "c"]));
    }

    #[test]
    fn should_trim_on_shrink_and_leave_holes_on_regrow() {
        let log: Log = Rc::default();
        let mut mapping = RuntimeMapping::new();
        mapping.ensure_path(&element_of(&["items"])).unwrap();
        mapping
            .ensure_path(&path(&["items", "length"]))
            .unwrap()
            .attach_set(logging_setter(&log, "trim"));

        let mut state = ReactiveState::new(&mapping, json!({"items": [1, 2, 3]})).unwrap();
        let root = state.root();
        let items = view(state.get(root, "items").unwrap());

        state.set(items, "length", json!(1)).unwrap();
        assert_eq!(*log.borrow(), vec!["trim:1:[]".to_string()]);
        assert_eq!(state.to_json(items), json!([1]));

        state.set_len(items, 3).unwrap();
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(state.to_json(items), json!([1, null, null]));
    }

    #[test]
    fn should_recover_array_from_rendered_output() {
        let mut mapping = RuntimeMapping::new();
        mapping
            .ensure_path(&element_of(&["rows"]))
            .unwrap()
            .attach_get(getter(|_state, indices| json!(format!("row{}", indices[0]))));
        mapping
            .ensure_path(&path(&["rows", "length"]))
            .unwrap()
            .attach_get(getter(|_state, _indices| json!(2)));

        let mut state = ReactiveState::new(&mapping, json!({})).unwrap();
        let root = state.root();
        let rows = view(state.get(root, "rows").unwrap());
        assert_eq!(value(state.get(rows, "length").unwrap()), json!(2));
        assert_eq!(value(state.get_index(rows, 1).unwrap()), json!("row1"));
        assert_eq!(state.to_json(root), json!({"rows": [null, "row1"]}));
    }

    #[test]
    fn should_pass_loop_indices_to_nested_callbacks() {
        let mut mapping = RuntimeMapping::new();
        let mut name = element_of(&["items"]);
        name.push(PathSegment::property("name"));
        mapping
            .ensure_path(&name)
            .unwrap()
            .attach_get(getter(|_state, indices| json!(indices.to_vec())));

        let mut state = ReactiveState::new(&mapping, json!({"items": [{}, {}]})).unwrap();
        let root = state.root();
        let items = view(state.get(root, "items").unwrap());
        let second = view(state.get_index(items, 1).unwrap());
        assert_eq!(value(state.get(second, "name").unwrap()), json!([1]));
    }

    #[test]
    fn should_merge_typed_writes_through_setters() {
        let log: Log = Rc::default();
        let mut mapping = RuntimeMapping::new();
        mapping
            .ensure_path(&path(&["user", "name"]))
            .unwrap()
            .attach_set(logging_setter(&log, "name"));

        let mut state = ReactiveState::new(&mapping, json!({"user": {"name": "Ann", "age": 3}})).unwrap();
        let root = state.root();
        state.set(root, "user", json!({"name": "Bo"})).unwrap();

        assert_eq!(*log.borrow(), vec!["name:\"Bo\":[]".to_string()]);
        assert_eq!(state.to_json(root), json!({"user": {"name": "Bo", "age": 3}}));
    }

    #[test]
    fn should_reject_scalars_where_objects_are_mapped() {
        let mut mapping = RuntimeMapping::new();
        mapping.ensure_path(&path(&["user", "name"])).unwrap();

        let mut state = ReactiveState::new(&mapping, json!({"user": 5})).unwrap();
        let root = state.root();
        assert_eq!(
            state.get(root, "user"),
            Err(RuntimeError::NotAnObject { found: "a number" })
        );
    }

    #[test]
    fn should_read_and_write_through_paths() {
        let mut mapping = RuntimeMapping::new();
        mapping.ensure_path(&path(&["user", "name"])).unwrap();

        let mut state = ReactiveState::new(&mapping, json!({"user": {"name": "Ann"}})).unwrap();
        state
            .set_path(&[Key::from("user"), Key::from("name")], json!("Bo"))
            .unwrap();
        assert_eq!(
            state.get_path(&[Key::from("user"), Key::from("name")]).unwrap(),
            Some(json!("Bo"))
        );
        assert_eq!(
            state.get_path(&[Key::from("user")]).unwrap(),
            Some(json!({"name": "Bo"}))
        );
        assert_eq!(
            state.get_path(&[Key::from("missing"), Key::from("x")]).unwrap(),
            None
        );
    }

    #[test]
    fn should_answer_array_membership() {
        let mut mapping = RuntimeMapping::new();
        mapping.ensure_path(&element_of(&["items"])).unwrap();

        let mut state = ReactiveState::new(&mapping, json!({"items": [1, 2]})).unwrap();
        let root = state.root();
        let items = view(state.get(root, "items").unwrap());
        assert!(state.has(items, "length"));
        assert!(state.has(items, "1"));
        assert!(!state.has(items, "2"));
        assert_eq!(state.keys(items), vec!["0".to_string(), "1".to_string()]);
        assert_eq!(
            state.get_path(&[Key::from("items"), Key::from(0)]).unwrap(),
            Some(json!(1))
        );
    }

    #[test]
    fn should_run_container_setters_after_typed_writes() {
        let log: Log = Rc::default();
        let mut mapping = RuntimeMapping::new();
        mapping.ensure_path(&element_of(&["items"])).unwrap();
        mapping
            .ensure_path(&path(&["items"]))
            .unwrap()
            .attach_set(logging_setter(&log, "joined"));
        mapping.ensure_path(&path(&["user", "name"])).unwrap();
        mapping
            .ensure_path(&path(&["user"]))
            .unwrap()
            .attach_set(logging_setter(&log, "user"));

        let mut state = ReactiveState::new(&mapping, json!({"items": [1], "user": {"name": "Ann"}})).unwrap();
        let root = state.root();
        state.set(root, "items", json!([1, 2, 3])).unwrap();
        state.set(root, "user", json!({"name": "Bo"})).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "joined:[1,2,3]:[]".to_string(),
                "user:{\"name\":\"Bo\"}:[]".to_string(),
            ]
        );
        assert_eq!(
            state.to_json(root),
            json!({"items": [1, 2, 3], "user": {"name": "Bo"}})
        );
    }

    #[test]
    fn should_run_container_setters_on_element_and_length_writes() {
        let log: Log = Rc::default();
        let mut mapping = RuntimeMapping::new();
        mapping.ensure_path(&element_of(&["items"])).unwrap();
        mapping
            .ensure_path(&path(&["items"]))
            .unwrap()
            .attach_set(logging_setter(&log, "list"));
        mapping
            .ensure_path(&path(&["items", "length"]))
            .unwrap()
            .attach_set(logging_setter(&log, "trim"));

        let mut state = ReactiveState::new(&mapping, json!({"items": ["a", "b"]})).unwrap();
        let root = state.root();
        let items = view(state.get(root, "items").unwrap());
        state.set_index(items, 1, json!("c")).unwrap();
        state.set_index(items, 2, json!("d")).unwrap();
        state.set(items, "length", json!(1)).unwrap();
        state.set_len(items, 3).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "list:[\"a\",\"c\"]:[]".to_string(),
                "list:[\"a\",\"c\",\"d\"]:[]".to_string(),
                "trim:1:[]".to_string(),
                "list:[\"a\"]:[]".to_string(),
            ]
        );
    }

    #[test]
    fn should_reject_indices_and_lengths_beyond_array_limits() {
        let mut mapping = RuntimeMapping::new();
        mapping.ensure_path(&element_of(&["items"])).unwrap();

        let mut state = ReactiveState::new(&mapping, json!({"items": [1, 2]})).unwrap();
        let root = state.root();
        let items = view(state.get(root, "items").unwrap());

        assert_eq!(
            state.set_index(items, usize::MAX, json!(1)),
            Err(RuntimeError::InvalidArrayIndex { index: usize::MAX })
        );
        assert_eq!(
            state.set(items, "length", json!(u64::MAX)),
            Err(RuntimeError::InvalidArrayLength { length: u64::MAX })
        );
        assert_eq!(state.get_index(items, usize::MAX).unwrap(), None);
        assert_eq!(state.to_json(items), json!([1, 2]));
    }

    #[test]
    fn should_store_far_elements_without_filling_holes() {
        let mut mapping = RuntimeMapping::new();
        mapping.ensure_path(&element_of(&["items"])).unwrap();

        let mut state = ReactiveState::new(&mapping, json!({"items": [1, 2]})).unwrap();
        let root = state.root();
        let items = view(state.get(root, "items").unwrap());
        let last = MAX_ARRAY_LENGTH - 1;
        state.set_index(items, last, json!("last")).unwrap();

        assert_eq!(state.len(items), MAX_ARRAY_LENGTH);
        assert_eq!(value(state.get_index(items, last).unwrap()), json!("last"));
        assert_eq!(
            state.keys(items),
            vec!["0".to_string(), "1".to_string(), last.to_string()]
        );
        assert!(!state.has(items, "5"));

        state.set_len(items, 2).unwrap();
        assert_eq!(state.to_json(items), json!([1, 2]));
    }

    #[test]
    fn should_not_grow_arrays_when_reading_far_typed_elements() {
        let mut mapping = RuntimeMapping::new();
        let mut name = element_of(&["items"]);
        name.push(PathSegment::property("name"));
        mapping.ensure_path(&name).unwrap();

        let mut state = ReactiveState::new(&mapping, json!({"items": [{"name": "a"}]})).unwrap();
        let root = state.root();
        let items = view(state.get(root, "items").unwrap());
        let far = view(state.get_index(items, 1_000_000).unwrap());

        assert_eq!(state.get(far, "name").unwrap(), None);
        assert_eq!(state.len(items), 1);
        assert_eq!(state.to_json(items), json!([{"name": "a"}]));
    }
}
