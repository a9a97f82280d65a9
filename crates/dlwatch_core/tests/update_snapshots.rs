use std::time::Duration;

use dlwatch_core::{
    update, AppState, Effect, FileEntry, FilesResponse, JobStatus, Msg, TaskSummary, TasksResponse,
    TimerKind,
};
use pretty_assertions::assert_eq;

fn started() -> (AppState, u64) {
    let (state, effects) = update(AppState::new(), Msg::AppStarted);
    let epoch = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::FetchTasks { epoch } => Some(*epoch),
            _ => None,
        })
        .expect("initial task fetch");
    (state, epoch)
}

fn tasks_from_json(json: &str) -> Vec<TaskSummary> {
    serde_json::from_str::<TasksResponse>(json)
        .expect("tasks json")
        .into_summaries()
}

fn next_task_epoch(state: AppState) -> (AppState, u64) {
    let (state, effects) = update(state, Msg::Tick(TimerKind::TaskList));
    match effects.as_slice() {
        [Effect::FetchTasks { epoch }] => (state, *epoch),
        other => panic!("expected one task fetch, got {other:?}"),
    }
}

#[test]
fn app_start_schedules_task_polling_and_file_listing() {
    let (_state, effects) = update(AppState::new(), Msg::AppStarted);
    assert_eq!(
        effects,
        vec![
            Effect::StartTimer {
                timer: TimerKind::TaskList,
                interval: Duration::from_millis(1500),
            },
            Effect::FetchTasks { epoch: 1 },
            Effect::FetchFiles,
        ]
    );
}

#[test]
fn scenario_c_active_count_counts_unfinished_tasks() {
    let (state, epoch) = started();
    let tasks = tasks_from_json(
        r#"{"tasks":[{"id":"j1","url":"http://x/1","status":"Downloading","done":false,"progress":40},
                      {"id":"j2","url":"http://x/2","status":"Completed","done":true,"success":true,"progress":100}]}"#,
    );
    let (mut state, _) = update(
        state,
        Msg::TasksFetched {
            epoch,
            result: Ok(tasks),
        },
    );
    assert!(state.consume_dirty());

    let view = state.view();
    assert_eq!(view.active_count, 1);
    assert_eq!(view.tasks.len(), 2);
    assert_eq!(view.tasks[1].status, JobStatus::Done);
    assert_eq!(view.tasks[0].title, "http://x/1");
}

#[test]
fn server_order_is_kept_and_snapshot_replaced_wholesale() {
    let (state, epoch) = started();
    let first = tasks_from_json(
        r#"{"tasks":[{"id":"b","url":"u","done":false},{"id":"a","url":"u","done":false}]}"#,
    );
    let (state, _) = update(state, Msg::TasksFetched { epoch, result: Ok(first) });
    let ids: Vec<_> = state.view().tasks.iter().map(|t| t.id.clone().unwrap()).collect();
    assert_eq!(ids, vec!["b", "a"]);

    let (state, epoch) = next_task_epoch(state);
    let second = tasks_from_json(r#"{"tasks":[{"id":"c","url":"u","done":true}]}"#);
    let (state, _) = update(state, Msg::TasksFetched { epoch, result: Ok(second) });
    let ids: Vec<_> = state.view().tasks.iter().map(|t| t.id.clone().unwrap()).collect();
    assert_eq!(ids, vec!["c"]);
    assert_eq!(state.view().active_count, 0);
}

#[test]
fn task_poll_failure_keeps_previous_snapshot_and_keeps_ticking() {
    let (state, epoch) = started();
    let tasks = tasks_from_json(r#"{"tasks":[{"id":"j1","url":"u","done":false,"progress":5}]}"#);
    let (state, _) = update(state, Msg::TasksFetched { epoch, result: Ok(tasks) });
    let before = state.view().tasks;

    let (state, epoch) = next_task_epoch(state);
    let (state, effects) = update(
        state,
        Msg::TasksFetched {
            epoch,
            result: Err("http status 502".into()),
        },
    );
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.tasks, before);
    assert_eq!(view.tasks_error.as_deref(), Some("http status 502"));

    // Next tick polls again, and success clears the error.
    let (state, epoch) = next_task_epoch(state);
    let (state, _) = update(state, Msg::TasksFetched { epoch, result: Ok(Vec::new()) });
    assert_eq!(state.view().tasks_error, None);
    assert!(state.view().tasks.is_empty());
}

#[test]
fn task_ticks_skip_while_fetch_in_flight() {
    let (state, _epoch) = started();
    let (_state, effects) = update(state, Msg::Tick(TimerKind::TaskList));
    assert!(effects.is_empty());
}

#[test]
fn scenario_d_file_sizes_are_formatted() {
    let (state, _) = started();
    let files: Vec<FileEntry> = serde_json::from_str::<FilesResponse>(
        r#"{"files":[{"name":"a.mp4","size":1048576,"mtime":1700000000}]}"#,
    )
    .unwrap()
    .into_entries();
    let (state, effects) = update(state, Msg::FilesFetched(Ok(files)));
    assert!(effects.is_empty());

    let view = state.view();
    assert!(view.files_loaded);
    assert_eq!(view.files.len(), 1);
    assert_eq!(view.files[0].size_text, "1.0 MB");
    assert_eq!(view.files[0].href, "/download/a.mp4");
    assert_ne!(view.files[0].mtime_text, "-");
}

#[test]
fn file_refresh_failure_keeps_previous_listing() {
    let (state, _) = started();
    let entry = FileEntry {
        name: "a.mp4".into(),
        size: 10,
        mtime: None,
    };
    let (state, _) = update(state, Msg::FilesFetched(Ok(vec![entry.clone()])));

    let (state, effects) = update(state, Msg::RefreshFilesClicked);
    assert_eq!(effects, vec![Effect::FetchFiles]);
    let (state, effects) = update(state, Msg::FilesFetched(Err("timeout".into())));
    assert!(effects.is_empty());
    assert_eq!(state.files().files(), &[entry]);
    assert_eq!(state.view().files[0].mtime_text, "-");
}

#[test]
fn manual_refresh_during_fetch_issues_one_follow_up() {
    let (state, _) = started();
    let (state, effects) = update(state, Msg::RefreshFilesClicked);
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::RefreshFilesClicked);
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::FilesFetched(Ok(Vec::new())));
    assert_eq!(effects, vec![Effect::FetchFiles]);
    let (_state, effects) = update(state, Msg::FilesFetched(Ok(Vec::new())));
    assert!(effects.is_empty());
}
