//! Daily auto-backup: idempotence and retention.

mod common;

use chrono::{DateTime, Days, Utc};
use pretty_assertions::assert_eq;
use raceday_core::responses::AutoBackupStatus;
use raceday_db::{AdminService, MemoryStore};

use common::{admin, config_in, runner, seed, staff};

fn day(n: u64) -> DateTime<Utc> {
    let start: DateTime<Utc> = "2026-01-01T06:30:00Z".parse().unwrap();
    start.checked_add_days(Days::new(n)).unwrap()
}

#[tokio::test]
async fn second_call_on_the_same_day_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let svc = AdminService::new(MemoryStore::new(), config_in(dir.path()));
    seed(svc.store()).await;

    let first = svc.check_and_create_auto_backup(&admin(), day(0)).await.unwrap();
    let AutoBackupStatus::Created { file, pruned, warnings } = first else {
        panic!("expected a new backup, got {first:?}");
    };
    assert_eq!(file, "backup-2026-01-01.json");
    assert!(pruned.is_empty() && warnings.is_empty());

    let path = dir.path().join("daily").join(&file);
    let written = std::fs::read(&path).unwrap();
    let modified = std::fs::metadata(&path).unwrap().modified().unwrap();

    let later_same_day = day(0) + chrono::Duration::hours(12);
    let second = svc
        .check_and_create_auto_backup(&admin(), later_same_day)
        .await
        .unwrap();
    assert_eq!(second, AutoBackupStatus::Exists { file: file.clone() });
    assert_eq!(std::fs::read(&path).unwrap(), written);
    assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), modified);
    assert_eq!(svc.list_auto_backups().await.unwrap(), vec![file]);
}

#[tokio::test]
async fn retention_keeps_the_newest_thirty() {
    let dir = tempfile::tempdir().unwrap();
    let svc = AdminService::new(MemoryStore::new(), config_in(dir.path()));
    seed(svc.store()).await;

    for n in 0..35 {
        let status = svc.check_and_create_auto_backup(&admin(), day(n)).await.unwrap();
        assert!(matches!(status, AutoBackupStatus::Created { .. }));
        let count = svc.list_auto_backups().await.unwrap().len();
        assert!(count <= 30, "day {n}: {count} files retained");
    }

    let names = svc.list_auto_backups().await.unwrap();
    assert_eq!(names.len(), 30);
    assert_eq!(names.first().unwrap(), "backup-2026-02-04.json");
    assert_eq!(names.last().unwrap(), "backup-2026-01-06.json");
    assert!(names.windows(2).all(|w| w[0] > w[1]), "newest first");
}

#[tokio::test]
async fn non_admins_are_skipped_silently() {
    let dir = tempfile::tempdir().unwrap();
    let svc = AdminService::new(MemoryStore::new(), config_in(dir.path()));
    for actor in [runner(), staff()] {
        let status = svc.check_and_create_auto_backup(&actor, day(0)).await.unwrap();
        assert_eq!(status, AutoBackupStatus::Skipped);
    }
    assert!(!dir.path().join("daily").exists());
    assert!(svc.list_auto_backups().await.unwrap().is_empty());
}

#[tokio::test]
async fn foreign_files_in_the_directory_are_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let daily = dir.path().join("daily");
    std::fs::create_dir_all(&daily).unwrap();
    std::fs::write(daily.join("README.txt"), b"operator notes").unwrap();
    std::fs::write(daily.join("backup-manual.json"), b"{}").unwrap();

    let mut config = config_in(dir.path());
    config.backup.retention = 1;
    let svc = AdminService::new(MemoryStore::new(), config);

    svc.check_and_create_auto_backup(&admin(), day(0)).await.unwrap();
    let status = svc.check_and_create_auto_backup(&admin(), day(1)).await.unwrap();
    assert_eq!(
        status,
        AutoBackupStatus::Created {
            file: "backup-2026-01-02.json".into(),
            pruned: vec!["backup-2026-01-01.json".into()],
            warnings: Vec::new(),
        }
    );
    assert!(daily.join("README.txt").exists());
    assert!(daily.join("backup-manual.json").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_first_calls_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let svc = AdminService::new(MemoryStore::new(), config_in(dir.path()));
    seed(svc.store()).await;
    let actor = admin();

    for round in 0..10 {
        let calls = (0..4).map(|_| svc.check_and_create_auto_backup(&actor, day(round)));
        for status in futures::future::join_all(calls).await {
            let status = status.unwrap();
            assert!(
                matches!(status, AutoBackupStatus::Created { .. } | AutoBackupStatus::Exists { .. }),
                "{status:?}"
            );
        }
    }

    let files: Vec<String> = std::fs::read_dir(dir.path().join("daily"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 10, "{files:?}");
    assert!(files.iter().all(|name| name.ends_with(".json")), "{files:?}");
}
