//! Operation-stream properties for edit sessions.
//!
//! Random edit streams are replayed against a session and checked for the
//! discard law, draft validity after every step, and lossless persistence
//! of whatever gets committed.

use floorplan_core::{
    CellRect, EdgeAnchor, EntityId, EntranceId, Footprint, Layout, Side, TableId, TableShape,
};
use floorplan_editor::{
    EditSession, Ghost, JsonDirLayoutStore, LayoutStore, MemoryLayoutStore, SessionError,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum EditOp {
    AddTable(u16, u16),
    AddEntrance,
    DeleteTable(u8),
    DeleteEntrance(u8),
    Rename(u8, String),
    Shape(u8, bool),
    Capacity(u8, Option<u16>),
    ResizeGrid(u16, u16),
    MoveTable(u8, u16, u16),
    MoveEntrance(u8, u8, u16, u16),
}

fn op_strategy() -> impl Strategy<Value = EditOp> {
    prop_oneof![
        (1u16..=6, 1u16..=5).prop_map(|(w, h)| EditOp::AddTable(w, h)),
        Just(EditOp::AddEntrance),
        any::<u8>().prop_map(EditOp::DeleteTable),
        any::<u8>().prop_map(EditOp::DeleteEntrance),
        (any::<u8>(), "[ a-zA-Z]{0,8}").prop_map(|(i, name)| EditOp::Rename(i, name)),
        (any::<u8>(), any::<bool>()).prop_map(|(i, round)| EditOp::Shape(i, round)),
        (any::<u8>(), proptest::option::of(1u16..=12))
            .prop_map(|(i, cap)| EditOp::Capacity(i, cap)),
        (0u16..=30, 0u16..=30).prop_map(|(c, r)| EditOp::ResizeGrid(c, r)),
        (any::<u8>(), 0u16..30, 0u16..30).prop_map(|(i, x, y)| EditOp::MoveTable(i, x, y)),
        (any::<u8>(), 0u8..4, 0u16..30, 1u16..=5)
            .prop_map(|(i, s, o, span)| EditOp::MoveEntrance(i, s, o, span)),
    ]
}

fn nth_table(session: &EditSession, i: u8) -> Option<TableId> {
    let tables = &session.view().tables;
    (!tables.is_empty()).then(|| tables[usize::from(i) % tables.len()].id.clone())
}

fn nth_entrance(session: &EditSession, i: u8) -> Option<EntranceId> {
    let entrances = &session.view().entrances;
    (!entrances.is_empty()).then(|| entrances[usize::from(i) % entrances.len()].id.clone())
}

fn apply(session: &mut EditSession, op: &EditOp) -> Result<(), SessionError> {
    match op {
        EditOp::AddTable(w, h) => session.add_table(Footprint::new(*w, *h)).map(|_| ()),
        EditOp::AddEntrance => session.add_entrance().map(|_| ()),
        EditOp::DeleteTable(i) => match nth_table(session, *i) {
            Some(id) => session.delete_entity(&EntityId::Table(id)),
            None => Ok(()),
        },
        EditOp::DeleteEntrance(i) => match nth_entrance(session, *i) {
            Some(id) => session.delete_entity(&EntityId::Entrance(id)),
            None => Ok(()),
        },
        EditOp::Rename(i, name) => match nth_table(session, *i) {
            Some(id) => session.rename_table(&id, name),
            None => Ok(()),
        },
        EditOp::Shape(i, round) => match nth_table(session, *i) {
            Some(id) => {
                let shape = if *round {
                    TableShape::Round
                } else {
                    TableShape::Square
                };
                session.set_table_shape(&id, shape)
            }
            None => Ok(()),
        },
        EditOp::Capacity(i, capacity) => match nth_table(session, *i) {
            Some(id) => session.set_table_capacity(&id, *capacity),
            None => Ok(()),
        },
        EditOp::ResizeGrid(columns, rows) => session.resize_grid(*columns, *rows).map(|_| ()),
        EditOp::MoveTable(i, x, y) => match nth_table(session, *i) {
            Some(id) => {
                let table = session.view().table(&id).expect("listed table exists");
                let rect = CellRect::new(*x, *y, table.width, table.height);
                session.apply_ghost(&Ghost::Table { id, rect })
            }
            None => Ok(()),
        },
        EditOp::MoveEntrance(i, side, offset, span) => match nth_entrance(session, *i) {
            Some(id) => {
                let side = Side::ALL[usize::from(*side) % 4];
                let anchor = EdgeAnchor::new(side, *offset, *span);
                session.apply_ghost(&Ghost::Entrance { id, anchor })
            }
            None => Ok(()),
        },
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn discard_restores_committed_layout(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut session = EditSession::new(Layout::default());
        let before = session.committed().clone();
        session.enter_edit().expect("enter edit");
        for op in &ops {
            apply(&mut session, op).expect("edits succeed while editing");
        }
        session.discard().expect("discard");
        prop_assert_eq!(session.view(), &before);
        prop_assert_eq!(session.view().state_hash(), before.state_hash());
    }

    #[test]
    fn draft_stays_valid_after_every_edit(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut session = EditSession::new(Layout::default());
        session.enter_edit().expect("enter edit");
        for op in &ops {
            apply(&mut session, op).expect("edits succeed while editing");
            let report = session.view().invariant_report();
            prop_assert!(report.is_valid(), "{op:?} broke the draft: {report:?}");
        }
    }

    #[test]
    fn committed_layout_round_trips_through_json_store(
        ops in prop::collection::vec(op_strategy(), 0..30),
    ) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = JsonDirLayoutStore::new(dir.path());
        let mut session = EditSession::new(store.load_layout().expect("initial load"));
        session.enter_edit().expect("enter edit");
        for op in &ops {
            apply(&mut session, op).expect("edits succeed while editing");
        }
        session.commit_to(&mut store).expect("commit");
        let reloaded = store.load_layout().expect("reload");
        prop_assert_eq!(&reloaded, session.committed());
    }

    #[test]
    fn failed_commit_never_changes_committed(
        ops in prop::collection::vec(op_strategy(), 1..20),
    ) {
        let mut store = MemoryLayoutStore::new(Layout::default());
        let mut session = EditSession::new(store.load_layout().expect("load"));
        session.enter_edit().expect("enter edit");
        for op in &ops {
            apply(&mut session, op).expect("edits succeed while editing");
        }
        let draft = session.draft().cloned().expect("draft");
        store.fail_next_saves(1);
        prop_assert!(session.commit_to(&mut store).is_err());
        prop_assert_eq!(session.committed(), &Layout::default());
        prop_assert_eq!(session.draft(), Some(&draft));
        prop_assert_eq!(store.stored(), Some(&Layout::default()));
    }
}
