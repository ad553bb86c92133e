//! Meeting persistence.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{Meeting, MeetingStatus, NewMeeting};

const MEETING_COLUMNS: &str = "id, room_name, session_id, claim_id, patient_name, procedure, \
                               moderator_url, patient_url, status, created_at";

/// Insert a meeting in `pending` status.
///
/// Room name and session id uniqueness are enforced by the schema, so two
/// concurrent inserts of the same room resolve to one success and one
/// [`DatabaseError::AlreadyExists`].
pub async fn create_meeting(pool: &SqlitePool, meeting: &NewMeeting) -> Result<Meeting> {
    let query = format!(
        r#"
        INSERT INTO meetings (room_name, session_id, claim_id, patient_name, procedure,
                              moderator_url, patient_url, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {MEETING_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Meeting>(&query)
        .bind(&meeting.room_name)
        .bind(&meeting.session_id)
        .bind(meeting.claim_id)
        .bind(&meeting.patient_name)
        .bind(&meeting.procedure)
        .bind(&meeting.moderator_url)
        .bind(&meeting.patient_url)
        .bind(MeetingStatus::Pending)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            DatabaseError::from_constraint(
                e,
                "Meeting",
                meeting.room_name.clone(),
                meeting.claim_id.map(|id| ("Claim", id.to_string())),
            )
        })
}

/// Get a meeting by ID.
pub async fn get_meeting(pool: &SqlitePool, id: i64) -> Result<Meeting> {
    let query = format!("SELECT {MEETING_COLUMNS} FROM meetings WHERE id = ?");

    sqlx::query_as::<_, Meeting>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Meeting",
            id: id.to_string(),
        })
}

/// Get a meeting by its conference room name.
pub async fn get_meeting_by_room(pool: &SqlitePool, room_name: &str) -> Result<Meeting> {
    let query = format!("SELECT {MEETING_COLUMNS} FROM meetings WHERE room_name = ?");

    sqlx::query_as::<_, Meeting>(&query)
        .bind(room_name)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Meeting",
            id: room_name.to_string(),
        })
}

/// Get a meeting by its session identifier.
pub async fn get_meeting_by_session(pool: &SqlitePool, session_id: &str) -> Result<Meeting> {
    let query = format!("SELECT {MEETING_COLUMNS} FROM meetings WHERE session_id = ?");

    sqlx::query_as::<_, Meeting>(&query)
        .bind(session_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Meeting",
            id: session_id.to_string(),
        })
}

/// All meetings for a claim, newest first.
pub async fn list_meetings_for_claim(pool: &SqlitePool, claim_id: i64) -> Result<Vec<Meeting>> {
    let query = format!(
        "SELECT {MEETING_COLUMNS} FROM meetings WHERE claim_id = ? ORDER BY created_at DESC, id DESC"
    );

    let meetings = sqlx::query_as::<_, Meeting>(&query)
        .bind(claim_id)
        .fetch_all(pool)
        .await?;

    Ok(meetings)
}

/// Overwrite a meeting's status, returning the status it had before.
///
/// No transition rules are applied here; callers decide what is legal. The
/// write lock is taken before the read, so concurrent writers queue on the
/// busy timeout instead of failing with `database is locked`.
pub async fn set_meeting_status(
    pool: &SqlitePool,
    id: i64,
    status: MeetingStatus,
) -> Result<MeetingStatus> {
    let mut conn = pool.acquire().await?;

    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
    let result = overwrite_status(&mut conn, id, status).await;
    let end = if result.is_ok() { "COMMIT" } else { "ROLLBACK" };
    sqlx::query(end).execute(&mut *conn).await?;

    result
}

async fn overwrite_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: MeetingStatus,
) -> Result<MeetingStatus> {
    let previous = sqlx::query_scalar::<_, MeetingStatus>("SELECT status FROM meetings WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Meeting",
            id: id.to_string(),
        })?;

    sqlx::query("UPDATE meetings SET status = ? WHERE id = ?")
        .bind(status)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(previous)
}

/// Count meetings in a given status.
pub async fn count_meetings_by_status(pool: &SqlitePool, status: MeetingStatus) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM meetings WHERE status = ?")
        .bind(status)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewClaim;
    use crate::{claim, user, Database};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn new_meeting(room: &str, session: &str, claim_id: Option<i64>) -> NewMeeting {
        NewMeeting {
            room_name: room.to_string(),
            session_id: session.to_string(),
            claim_id,
            patient_name: Some("Jane Roe".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = test_db().await;
        let meeting = create_meeting(db.pool(), &new_meeting("room-a", "sess-a", None))
            .await
            .unwrap();
        assert_eq!(meeting.status, MeetingStatus::Pending);

        let by_room = get_meeting_by_room(db.pool(), "room-a").await.unwrap();
        let by_session = get_meeting_by_session(db.pool(), "sess-a").await.unwrap();
        assert_eq!(by_room, meeting);
        assert_eq!(by_session, meeting);

        let missing = get_meeting_by_session(db.pool(), "nope").await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { entity: "Meeting", .. })));
    }

    #[tokio::test]
    async fn test_duplicate_room_rejected() {
        let db = test_db().await;
        create_meeting(db.pool(), &new_meeting("room-a", "sess-a", None))
            .await
            .unwrap();

        let result = create_meeting(db.pool(), &new_meeting("room-a", "sess-b", None)).await;
        assert!(matches!(
            result,
            Err(DatabaseError::AlreadyExists { entity: "Meeting", .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_room_creation_has_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("meetings.db").display());
        let db = Database::connect(&url).await.unwrap();
        db.migrate().await.unwrap();

        let first = new_meeting("room-shared", "sess-1", None);
        let second = new_meeting("room-shared", "sess-2", None);
        let (a, b) = tokio::join!(
            create_meeting(db.pool(), &first),
            create_meeting(db.pool(), &second)
        );

        let outcomes = [a, b];
        let successes = outcomes.iter().filter(|r| r.is_ok()).count();
        let conflicts = outcomes
            .iter()
            .filter(|r| matches!(r, Err(DatabaseError::AlreadyExists { .. })))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_status_writes_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("status.db").display());
        let db = Database::connect(&url).await.unwrap();
        db.migrate().await.unwrap();

        let mut ids = Vec::new();
        for i in 0..20 {
            let meeting = new_meeting(&format!("room-{}", i), &format!("sess-{}", i), None);
            ids.push(create_meeting(db.pool(), &meeting).await.unwrap().id);
        }

        let mut handles = Vec::new();
        for id in ids.iter().copied() {
            for status in [MeetingStatus::Active, MeetingStatus::Completed] {
                let db = db.clone();
                handles.push(tokio::spawn(async move {
                    set_meeting_status(db.pool(), id, status).await
                }));
            }
        }

        for handle in handles {
            let previous = handle.await.unwrap().unwrap();
            assert!(matches!(
                previous,
                MeetingStatus::Pending | MeetingStatus::Active | MeetingStatus::Completed
            ));
        }
        for id in ids {
            let status = get_meeting(db.pool(), id).await.unwrap().status;
            assert!(matches!(status, MeetingStatus::Active | MeetingStatus::Completed));
        }
    }

    #[tokio::test]
    async fn test_failed_status_write_releases_connection() {
        let db = test_db().await;
        let missing = set_meeting_status(db.pool(), 404, MeetingStatus::Active).await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { entity: "Meeting", .. })));

        let meeting = create_meeting(db.pool(), &new_meeting("room-a", "sess-a", None))
            .await
            .unwrap();
        let previous = set_meeting_status(db.pool(), meeting.id, MeetingStatus::Active)
            .await
            .unwrap();
        assert_eq!(previous, MeetingStatus::Pending);
    }

    #[tokio::test]
    async fn test_unknown_claim_is_not_found() {
        let db = test_db().await;
        let result = create_meeting(db.pool(), &new_meeting("room-a", "sess-a", Some(7))).await;
        assert!(matches!(
            result,
            Err(DatabaseError::NotFound { entity: "Claim", .. })
        ));
    }

    #[tokio::test]
    async fn test_set_status_returns_previous() {
        let db = test_db().await;
        let meeting = create_meeting(db.pool(), &new_meeting("room-a", "sess-a", None))
            .await
            .unwrap();

        let previous = set_meeting_status(db.pool(), meeting.id, MeetingStatus::Active)
            .await
            .unwrap();
        assert_eq!(previous, MeetingStatus::Pending);

        let previous = set_meeting_status(db.pool(), meeting.id, MeetingStatus::Completed)
            .await
            .unwrap();
        assert_eq!(previous, MeetingStatus::Active);
        assert_eq!(
            count_meetings_by_status(db.pool(), MeetingStatus::Completed)
                .await
                .unwrap(),
            1
        );

        let missing = set_meeting_status(db.pool(), 999, MeetingStatus::Completed).await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_meetings_for_claim_newest_first() {
        let db = test_db().await;
        let owner = user::create_user(db.pool(), "ops@example.com", "hunter22")
            .await
            .unwrap();
        let claim = claim::create_claim(
            db.pool(),
            owner.id,
            &NewClaim {
                claim_number: "CLM-001".to_string(),
                patient_mobile: "+15551234567".to_string(),
                hospital_city: "Springfield".to_string(),
                hospital_state: "IL".to_string(),
                language: "en".to_string(),
            },
        )
        .await
        .unwrap();

        create_meeting(db.pool(), &new_meeting("room-1", "sess-1", Some(claim.id)))
            .await
            .unwrap();
        create_meeting(db.pool(), &new_meeting("room-2", "sess-2", Some(claim.id)))
            .await
            .unwrap();
        create_meeting(db.pool(), &new_meeting("room-x", "sess-x", None))
            .await
            .unwrap();

        let meetings = list_meetings_for_claim(db.pool(), claim.id).await.unwrap();
        assert_eq!(meetings.len(), 2);
        assert_eq!(meetings[0].room_name, "room-2");
        assert_eq!(meetings[1].room_name, "room-1");
    }
}
