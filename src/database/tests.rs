// Tests for the SQLite store and its sessions
// Run with: cargo test --lib database::tests

#[cfg(test)]
mod store_tests {
    use crate::database::Database;
    use crate::error::StoreError;
    use tempfile::TempDir;

    fn setup_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Database::new(&db_path).unwrap();
        (db, temp_dir)
    }

    #[test]
    fn test_insert_episode_returns_new_ids() {
        let (db, _temp) = setup_test_db();
        let first = db.insert_episode(1, 1).unwrap();
        let second = db.insert_episode(2, 0).unwrap();
        assert!(first > 0);
        assert!(second > first);

        let stored = db.get_episode(second).unwrap().unwrap();
        assert_eq!(stored.episode_number, 2);
        assert_eq!(stored.season, 0);
        assert!(!stored.added_date.is_empty());
        assert_eq!(db.get_episodes().unwrap()[1], stored);
        assert_eq!(db.get_episode(second + 1).unwrap(), None);
    }

    #[test]
    fn test_insert_same_episode_twice_creates_duplicates() {
        let (db, _temp) = setup_test_db();
        let a = db.insert_episode(7, 3).unwrap();
        let b = db.insert_episode(7, 3).unwrap();
        assert_ne!(a, b);
        assert_eq!(db.get_episodes().unwrap().len(), 2);
    }

    #[test]
    fn test_insert_character_line_reuses_character() {
        let (db, _temp) = setup_test_db();
        let episode = db.insert_episode(1, 1).unwrap();
        db.insert_character_line("PICARD", episode, "Engage.").unwrap();
        db.insert_character_line("DATA", episode, "Aye sir.").unwrap();
        db.insert_character_line("PICARD", episode, "Make it so.").unwrap();

        assert_eq!(db.count_characters().unwrap(), 2);
        assert_eq!(db.count_character_lines().unwrap(), 3);

        let lines = db.get_character_lines(episode).unwrap();
        let texts: Vec<(&str, &str)> = lines
            .iter()
            .map(|l| (l.character_name.as_str(), l.line_text.as_str()))
            .collect();
        assert_eq!(
            texts,
            vec![("PICARD", "Engage."), ("DATA", "Aye sir."), ("PICARD", "Make it so.")]
        );
    }

    #[test]
    fn test_character_names_are_case_sensitive() {
        let (db, _temp) = setup_test_db();
        let episode = db.insert_episode(1, 1).unwrap();
        db.insert_character_line("Data", episode, "One.").unwrap();
        db.insert_character_line("DATA", episode, "Two.").unwrap();
        assert_eq!(db.count_characters().unwrap(), 2);
    }

    #[test]
    fn test_insert_line_unicode_text() {
        let (db, _temp) = setup_test_db();
        let episode = db.insert_episode(1, 1).unwrap();
        db.insert_character_line("Señor 日本語", episode, "Qapla'! 🖖").unwrap();

        let lines = db.get_character_lines(episode).unwrap();
        assert_eq!(lines[0].character_name, "Señor 日本語");
        assert_eq!(lines[0].line_text, "Qapla'! 🖖");
    }

    #[test]
    fn test_insert_line_for_unknown_episode_is_row_error() {
        let (db, _temp) = setup_test_db();
        let result = db.insert_character_line("PICARD", 999, "Engage.");
        assert!(matches!(result, Err(StoreError::Row(_))));
        assert_eq!(db.count_character_lines().unwrap(), 0);
    }

    #[test]
    fn test_open_in_missing_directory_is_connection_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("store.db");
        assert!(matches!(Database::new(&path), Err(StoreError::Connection(_))));
    }
}

#[cfg(test)]
mod session_tests {
    use crate::database::{Database, SqliteConnector};
    use crate::gateway::{StoreConnector, StoreSession};
    use tempfile::TempDir;

    fn setup_connector() -> (SqliteConnector, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let connector = SqliteConnector::new(temp_dir.path().join("store.db"));
        (connector, temp_dir)
    }

    fn reader(connector: &SqliteConnector) -> Database {
        Database::new(connector.path()).unwrap()
    }

    #[test]
    fn test_committed_session_is_visible() {
        let (connector, _temp) = setup_connector();
        let mut session = connector.connect().unwrap();
        let id = session.insert_episode(4, 2).unwrap().unwrap();
        session.insert_character_line("ARCHER", id, "Hit it.").unwrap();
        session.commit().unwrap();

        let db = reader(&connector);
        assert_eq!(db.get_episodes().unwrap().len(), 1);
        assert_eq!(db.count_character_lines().unwrap(), 1);
    }

    #[test]
    fn test_dropped_session_rolls_back() {
        let (connector, _temp) = setup_connector();
        {
            let mut session = connector.connect().unwrap();
            session.insert_episode(4, 2).unwrap();
            session.insert_episode(5, 2).unwrap();
        }

        let db = reader(&connector);
        assert!(db.get_episodes().unwrap().is_empty());
    }

    #[test]
    fn test_rolled_back_group_leaves_earlier_work() {
        let (connector, _temp) = setup_connector();
        let mut session = connector.connect().unwrap();
        let id = session.insert_episode(1, 1).unwrap().unwrap();

        session.begin_group().unwrap();
        session.insert_character_line("KIRK", id, "Kept.").unwrap();
        session.commit_group().unwrap();

        session.begin_group().unwrap();
        session.insert_character_line("SPOCK", id, "Discarded.").unwrap();
        session.rollback_group().unwrap();

        session.commit().unwrap();

        let db = reader(&connector);
        let lines = db.get_character_lines(id).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_text, "Kept.");
        assert_eq!(db.count_characters().unwrap(), 1);
    }

    #[test]
    fn test_row_error_keeps_session_usable() {
        let (connector, _temp) = setup_connector();
        let mut session = connector.connect().unwrap();
        assert!(session.insert_character_line("Q", 12345, "Nope.").is_err());

        let id = session.insert_episode(9, 5).unwrap().unwrap();
        session.insert_character_line("Q", id, "Mon capitaine.").unwrap();
        session.commit().unwrap();

        assert_eq!(reader(&connector).count_character_lines().unwrap(), 1);
    }
}
