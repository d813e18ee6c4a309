//! SQLite-based entity storage.
//!
//! Pure data access: uniqueness and foreign-key invariants live here,
//! business rules live in the lifecycle/scheduler modules. Every write
//! that represents one logical transition is exposed as a single
//! conditional statement (`UPDATE ... WHERE status = ?`) so that two
//! racing callers cannot both apply the same side effect -- the loser
//! of the race observes an affected-row count of zero.

use chrono::{DateTime, Utc};
use indoc::indoc;
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::error::DatabaseError;
use crate::model::{
    BankHolderElection, BankHolderVote, Challenge, ChallengeStatus, Checkin, CheckinWindow,
    CommitmentTemplate, ElectionStatus, Goal, GoalVerdict, Participant, ParticipantStatus, Payment,
    PaymentStatus, Track, WindowStatus,
};

// === Helper functions ===

fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_datetime_opt(dt_str: Option<String>) -> Option<DateTime<Utc>> {
    dt_str.map(|s| parse_datetime_fallback(&s))
}

const CHALLENGE_COLS: &str = "id, chat_id, chat_title, creator_id, duration_value, stake_amount, \
     discipline_threshold, max_skips, bank_holder_id, bank_holder_username, status, created_at, \
     started_at, ends_at";

fn row_to_challenge(row: &rusqlite::Row) -> Result<Challenge, rusqlite::Error> {
    let status: String = row.get(10)?;
    let created_at: String = row.get(11)?;
    Ok(Challenge {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        chat_title: row.get(2)?,
        creator_id: row.get(3)?,
        duration_value: row.get(4)?,
        stake_amount: row.get(5)?,
        discipline_threshold: row.get(6)?,
        max_skips: row.get(7)?,
        bank_holder_id: row.get(8)?,
        bank_holder_username: row.get(9)?,
        status: ChallengeStatus::parse(&status),
        created_at: parse_datetime_fallback(&created_at),
        started_at: parse_datetime_opt(row.get(12)?),
        ends_at: parse_datetime_opt(row.get(13)?),
    })
}

const PARTICIPANT_COLS: &str = "id, challenge_id, user_id, username, first_name, track, \
     start_weight, start_waist, height, start_photo_front, start_photo_left, start_photo_right, \
     start_photo_back, total_checkins, completed_checkins, skipped_checkins, \
     pending_checkin_window_id, pending_checkin_requested_at, status, joined_at, \
     onboarding_completed_at";

fn row_to_participant(row: &rusqlite::Row) -> Result<Participant, rusqlite::Error> {
    let track: Option<String> = row.get(5)?;
    let status: String = row.get(18)?;
    let joined_at: String = row.get(19)?;
    Ok(Participant {
        id: row.get(0)?,
        challenge_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row.get(3)?,
        first_name: row.get(4)?,
        track: track.map(|t| Track::parse(&t)),
        start_weight: row.get(6)?,
        start_waist: row.get(7)?,
        height: row.get(8)?,
        start_photo_front: row.get(9)?,
        start_photo_left: row.get(10)?,
        start_photo_right: row.get(11)?,
        start_photo_back: row.get(12)?,
        total_checkins: row.get(13)?,
        completed_checkins: row.get(14)?,
        skipped_checkins: row.get(15)?,
        pending_checkin_window_id: row.get(16)?,
        pending_checkin_requested_at: parse_datetime_opt(row.get(17)?),
        status: ParticipantStatus::parse(&status),
        joined_at: parse_datetime_fallback(&joined_at),
        onboarding_completed_at: parse_datetime_opt(row.get(20)?),
    })
}

const GOAL_COLS: &str = "id, participant_id, target_weight, target_waist, is_validated, \
     validation_result, validation_feedback, validated_at, created_at, updated_at";

fn row_to_goal(row: &rusqlite::Row) -> Result<Goal, rusqlite::Error> {
    let verdict: Option<String> = row.get(5)?;
    let created_at: String = row.get(8)?;
    Ok(Goal {
        id: row.get(0)?,
        participant_id: row.get(1)?,
        target_weight: row.get(2)?,
        target_waist: row.get(3)?,
        is_validated: row.get(4)?,
        validation_result: verdict.map(|v| GoalVerdict::parse(&v)),
        validation_feedback: row.get(6)?,
        validated_at: parse_datetime_opt(row.get(7)?),
        created_at: parse_datetime_fallback(&created_at),
        updated_at: parse_datetime_opt(row.get(9)?),
    })
}

const PAYMENT_COLS: &str =
    "id, participant_id, status, marked_paid_at, confirmed_at, confirmed_by, created_at";

fn row_to_payment(row: &rusqlite::Row) -> Result<Payment, rusqlite::Error> {
    let status: String = row.get(2)?;
    let created_at: String = row.get(6)?;
    Ok(Payment {
        id: row.get(0)?,
        participant_id: row.get(1)?,
        status: PaymentStatus::parse(&status),
        marked_paid_at: parse_datetime_opt(row.get(3)?),
        confirmed_at: parse_datetime_opt(row.get(4)?),
        confirmed_by: row.get(5)?,
        created_at: parse_datetime_fallback(&created_at),
    })
}

const WINDOW_COLS: &str =
    "id, challenge_id, window_number, opens_at, closes_at, reminder_sent_at, status, created_at";

fn row_to_window(row: &rusqlite::Row) -> Result<CheckinWindow, rusqlite::Error> {
    let opens_at: String = row.get(3)?;
    let closes_at: String = row.get(4)?;
    let status: String = row.get(6)?;
    let created_at: String = row.get(7)?;
    Ok(CheckinWindow {
        id: row.get(0)?,
        challenge_id: row.get(1)?,
        window_number: row.get(2)?,
        opens_at: parse_datetime_fallback(&opens_at),
        closes_at: parse_datetime_fallback(&closes_at),
        reminder_sent_at: parse_datetime_opt(row.get(5)?),
        status: WindowStatus::parse(&status),
        created_at: parse_datetime_fallback(&created_at),
    })
}

const CHECKIN_COLS: &str = "id, participant_id, window_id, weight, waist, photo_front, \
     photo_left, photo_right, photo_back, submitted_at";

fn row_to_checkin(row: &rusqlite::Row) -> Result<Checkin, rusqlite::Error> {
    let submitted_at: String = row.get(9)?;
    Ok(Checkin {
        id: row.get(0)?,
        participant_id: row.get(1)?,
        window_id: row.get(2)?,
        weight: row.get(3)?,
        waist: row.get(4)?,
        photo_front: row.get(5)?,
        photo_left: row.get(6)?,
        photo_right: row.get(7)?,
        photo_back: row.get(8)?,
        submitted_at: parse_datetime_fallback(&submitted_at),
    })
}

const ELECTION_COLS: &str = "id, challenge_id, initiated_by, status, created_at, completed_at";

fn row_to_election(row: &rusqlite::Row) -> Result<BankHolderElection, rusqlite::Error> {
    let status: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    Ok(BankHolderElection {
        id: row.get(0)?,
        challenge_id: row.get(1)?,
        initiated_by: row.get(2)?,
        status: ElectionStatus::parse(&status),
        created_at: parse_datetime_fallback(&created_at),
        completed_at: parse_datetime_opt(row.get(5)?),
    })
}

fn row_to_vote(row: &rusqlite::Row) -> Result<BankHolderVote, rusqlite::Error> {
    let voted_at: String = row.get(4)?;
    Ok(BankHolderVote {
        id: row.get(0)?,
        election_id: row.get(1)?,
        voter_id: row.get(2)?,
        voted_for_id: row.get(3)?,
        voted_at: parse_datetime_fallback(&voted_at),
    })
}

fn row_to_template(row: &rusqlite::Row) -> Result<CommitmentTemplate, rusqlite::Error> {
    Ok(CommitmentTemplate {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        is_active: row.get(4)?,
    })
}

/// Fields for a new challenge row.
#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub chat_id: i64,
    pub chat_title: Option<String>,
    pub creator_id: i64,
    pub duration_value: i64,
    pub stake_amount: f64,
    pub discipline_threshold: f64,
    pub max_skips: i64,
}

/// Partial update of a participant's onboarding snapshot. `None`
/// fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct OnboardingUpdate {
    pub track: Option<Track>,
    pub start_weight: Option<f64>,
    pub start_waist: Option<f64>,
    pub height: Option<f64>,
    pub start_photo_front: Option<String>,
    pub start_photo_left: Option<String>,
    pub start_photo_right: Option<String>,
    pub start_photo_back: Option<String>,
}

/// SQLite database for fitstake entities.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/fitstake/fitstake.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("fitstake.db");
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, Box<dyn std::error::Error>> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(indoc! {"
            CREATE TABLE IF NOT EXISTS challenges (
                id                   INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id              INTEGER NOT NULL,
                chat_title           TEXT,
                creator_id           INTEGER NOT NULL,
                duration_value       INTEGER NOT NULL DEFAULT 6,
                stake_amount         REAL NOT NULL,
                discipline_threshold REAL NOT NULL DEFAULT 0.8,
                max_skips            INTEGER NOT NULL DEFAULT 2,
                bank_holder_id       INTEGER,
                bank_holder_username TEXT,
                status               TEXT NOT NULL DEFAULT 'draft',
                created_at           TEXT NOT NULL,
                started_at           TEXT,
                ends_at              TEXT
            );

            CREATE TABLE IF NOT EXISTS participants (
                id                           INTEGER PRIMARY KEY AUTOINCREMENT,
                challenge_id                 INTEGER NOT NULL REFERENCES challenges(id),
                user_id                      INTEGER NOT NULL,
                username                     TEXT,
                first_name                   TEXT,
                track                        TEXT,
                start_weight                 REAL,
                start_waist                  REAL,
                height                       REAL,
                start_photo_front            TEXT,
                start_photo_left             TEXT,
                start_photo_right            TEXT,
                start_photo_back             TEXT,
                total_checkins               INTEGER NOT NULL DEFAULT 0,
                completed_checkins           INTEGER NOT NULL DEFAULT 0,
                skipped_checkins             INTEGER NOT NULL DEFAULT 0,
                pending_checkin_window_id    INTEGER,
                pending_checkin_requested_at TEXT,
                status                       TEXT NOT NULL DEFAULT 'onboarding',
                joined_at                    TEXT NOT NULL,
                onboarding_completed_at      TEXT
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_participants_challenge_user
                ON participants(challenge_id, user_id);

            CREATE TABLE IF NOT EXISTS goals (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                participant_id      INTEGER NOT NULL REFERENCES participants(id),
                target_weight       REAL,
                target_waist        REAL,
                is_validated        INTEGER NOT NULL DEFAULT 0,
                validation_result   TEXT,
                validation_feedback TEXT,
                validated_at        TEXT,
                created_at          TEXT NOT NULL,
                updated_at          TEXT
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_goals_participant
                ON goals(participant_id);

            CREATE TABLE IF NOT EXISTS payments (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                participant_id INTEGER NOT NULL REFERENCES participants(id),
                status         TEXT NOT NULL DEFAULT 'pending',
                marked_paid_at TEXT,
                confirmed_at   TEXT,
                confirmed_by   INTEGER,
                created_at     TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_payments_participant
                ON payments(participant_id);

            CREATE TABLE IF NOT EXISTS checkin_windows (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                challenge_id     INTEGER NOT NULL REFERENCES challenges(id),
                window_number    INTEGER NOT NULL,
                opens_at         TEXT NOT NULL,
                closes_at        TEXT NOT NULL,
                reminder_sent_at TEXT,
                status           TEXT NOT NULL DEFAULT 'scheduled',
                created_at       TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_windows_challenge_number
                ON checkin_windows(challenge_id, window_number);
            CREATE INDEX IF NOT EXISTS idx_windows_status
                ON checkin_windows(status);

            CREATE TABLE IF NOT EXISTS checkins (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                participant_id INTEGER NOT NULL REFERENCES participants(id),
                window_id      INTEGER NOT NULL REFERENCES checkin_windows(id),
                weight         REAL NOT NULL,
                waist          REAL NOT NULL,
                photo_front    TEXT NOT NULL,
                photo_left     TEXT NOT NULL,
                photo_right    TEXT NOT NULL,
                photo_back     TEXT NOT NULL,
                submitted_at   TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_checkins_participant_window
                ON checkins(participant_id, window_id);

            CREATE TABLE IF NOT EXISTS bank_holder_elections (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                challenge_id INTEGER NOT NULL UNIQUE REFERENCES challenges(id),
                initiated_by INTEGER NOT NULL,
                status       TEXT NOT NULL DEFAULT 'in_progress',
                created_at   TEXT NOT NULL,
                completed_at TEXT
            );

            CREATE TABLE IF NOT EXISTS bank_holder_votes (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                election_id  INTEGER NOT NULL REFERENCES bank_holder_elections(id),
                voter_id     INTEGER NOT NULL,
                voted_for_id INTEGER NOT NULL,
                voted_at     TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_votes_election_voter
                ON bank_holder_votes(election_id, voter_id);

            CREATE TABLE IF NOT EXISTS commitment_templates (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL,
                category    TEXT NOT NULL,
                is_active   INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS participant_commitments (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                participant_id INTEGER NOT NULL REFERENCES participants(id),
                template_id    INTEGER NOT NULL REFERENCES commitment_templates(id),
                created_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS checkin_recommendations (
                id                     INTEGER PRIMARY KEY AUTOINCREMENT,
                checkin_id             INTEGER NOT NULL REFERENCES checkins(id),
                participant_id         INTEGER NOT NULL REFERENCES participants(id),
                progress_assessment    TEXT NOT NULL,
                body_composition_notes TEXT NOT NULL,
                nutrition_advice       TEXT NOT NULL,
                training_advice        TEXT NOT NULL,
                motivational_message   TEXT NOT NULL,
                warning_flags          TEXT,
                model                  TEXT NOT NULL,
                processing_time_ms     INTEGER,
                created_at             TEXT NOT NULL
            );
        "})?;
        self.seed_commitment_templates()?;
        Ok(())
    }

    fn seed_commitment_templates(&self) -> Result<(), rusqlite::Error> {
        const TEMPLATES: &[(&str, &str, &str)] = &[
            (
                "No sugar drinks",
                "Cut out soda and sweetened drinks entirely",
                "nutrition",
            ),
            (
                "Protein every meal",
                "Include a protein source in every meal",
                "nutrition",
            ),
            (
                "No late-night eating",
                "No food within three hours of bedtime",
                "nutrition",
            ),
            (
                "Three workouts a week",
                "At least three training sessions every week",
                "exercise",
            ),
            (
                "Daily 10k steps",
                "Walk at least 10,000 steps every day",
                "exercise",
            ),
            (
                "Morning mobility",
                "Ten minutes of stretching every morning",
                "exercise",
            ),
            ("Sleep by midnight", "In bed before midnight", "lifestyle"),
            ("No alcohol", "Zero alcohol for the whole challenge", "lifestyle"),
        ];
        let mut stmt = self.conn.prepare(
            "INSERT OR IGNORE INTO commitment_templates (name, description, category, is_active)
             VALUES (?1, ?2, ?3, 1)",
        )?;
        for (name, description, category) in TEMPLATES {
            stmt.execute(params![name, description, category])?;
        }
        Ok(())
    }

    // === Challenges ===

    pub fn create_challenge(
        &self,
        data: &NewChallenge,
        now: DateTime<Utc>,
    ) -> Result<Challenge, DatabaseError> {
        self.conn.execute(
            "INSERT INTO challenges (chat_id, chat_title, creator_id, duration_value, \
             stake_amount, discipline_threshold, max_skips, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'draft', ?8)",
            params![
                data.chat_id,
                data.chat_title,
                data.creator_id,
                data.duration_value,
                data.stake_amount,
                data.discipline_threshold,
                data.max_skips,
                ts(now),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.find_challenge(id)?
            .ok_or_else(|| DatabaseError::QueryFailed("challenge insert lost".into()))
    }

    pub fn find_challenge(&self, id: i64) -> Result<Option<Challenge>, DatabaseError> {
        let sql = format!("SELECT {CHALLENGE_COLS} FROM challenges WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt.query_row(params![id], row_to_challenge).optional()?)
    }

    /// The chat's challenge that is neither completed nor cancelled,
    /// if any. At most one exists by construction.
    pub fn find_ongoing_by_chat(&self, chat_id: i64) -> Result<Option<Challenge>, DatabaseError> {
        let sql = format!(
            "SELECT {CHALLENGE_COLS} FROM challenges \
             WHERE chat_id = ?1 AND status NOT IN ('completed', 'cancelled')"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt
            .query_row(params![chat_id], row_to_challenge)
            .optional()?)
    }

    pub fn list_active_challenges(&self) -> Result<Vec<Challenge>, DatabaseError> {
        let sql = format!("SELECT {CHALLENGE_COLS} FROM challenges WHERE status = 'active'");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_challenge)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Compare-and-swap on the challenge status. Returns `true` only
    /// for the caller whose expected `from` status still held.
    pub fn update_challenge_status_if(
        &self,
        id: i64,
        from: ChallengeStatus,
        to: ChallengeStatus,
    ) -> Result<bool, DatabaseError> {
        let n = self.conn.execute(
            "UPDATE challenges SET status = ?1 WHERE id = ?2 AND status = ?3",
            params![to.as_str(), id, from.as_str()],
        )?;
        Ok(n > 0)
    }

    pub fn set_bank_holder(
        &self,
        id: i64,
        user_id: i64,
        username: Option<&str>,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE challenges SET bank_holder_id = ?1, bank_holder_username = ?2 WHERE id = ?3",
            params![user_id, username, id],
        )?;
        Ok(())
    }

    /// Flip `pending_payments -> active` and stamp the start/end
    /// instants in one statement. The CAS makes concurrent
    /// last-payment detections activate exactly once.
    pub fn activate_challenge(
        &self,
        id: i64,
        started_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let n = self.conn.execute(
            "UPDATE challenges SET status = 'active', started_at = ?1, ends_at = ?2 \
             WHERE id = ?3 AND status = 'pending_payments'",
            params![ts(started_at), ts(ends_at), id],
        )?;
        Ok(n > 0)
    }

    // === Participants ===

    pub fn create_participant(
        &self,
        challenge_id: i64,
        user_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Participant, DatabaseError> {
        self.conn.execute(
            "INSERT INTO participants (challenge_id, user_id, username, first_name, status, joined_at)
             VALUES (?1, ?2, ?3, ?4, 'onboarding', ?5)",
            params![challenge_id, user_id, username, first_name, ts(now)],
        )?;
        let id = self.conn.last_insert_rowid();
        self.find_participant(id)?
            .ok_or_else(|| DatabaseError::QueryFailed("participant insert lost".into()))
    }

    pub fn find_participant(&self, id: i64) -> Result<Option<Participant>, DatabaseError> {
        let sql = format!("SELECT {PARTICIPANT_COLS} FROM participants WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt.query_row(params![id], row_to_participant).optional()?)
    }

    pub fn find_participant_by_user(
        &self,
        challenge_id: i64,
        user_id: i64,
    ) -> Result<Option<Participant>, DatabaseError> {
        let sql = format!(
            "SELECT {PARTICIPANT_COLS} FROM participants WHERE challenge_id = ?1 AND user_id = ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt
            .query_row(params![challenge_id, user_id], row_to_participant)
            .optional()?)
    }

    pub fn list_participants(&self, challenge_id: i64) -> Result<Vec<Participant>, DatabaseError> {
        let sql = format!(
            "SELECT {PARTICIPANT_COLS} FROM participants WHERE challenge_id = ?1 ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![challenge_id], row_to_participant)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_participants_by_status(
        &self,
        challenge_id: i64,
        status: ParticipantStatus,
    ) -> Result<Vec<Participant>, DatabaseError> {
        let sql = format!(
            "SELECT {PARTICIPANT_COLS} FROM participants \
             WHERE challenge_id = ?1 AND status = ?2 ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![challenge_id, status.as_str()], row_to_participant)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn update_participant_status(
        &self,
        id: i64,
        status: ParticipantStatus,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE participants SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(())
    }

    /// Compare-and-swap on the participant status.
    pub fn update_participant_status_if(
        &self,
        id: i64,
        from: ParticipantStatus,
        to: ParticipantStatus,
    ) -> Result<bool, DatabaseError> {
        let n = self.conn.execute(
            "UPDATE participants SET status = ?1 WHERE id = ?2 AND status = ?3",
            params![to.as_str(), id, from.as_str()],
        )?;
        Ok(n > 0)
    }

    pub fn set_onboarding_data(
        &self,
        id: i64,
        update: &OnboardingUpdate,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE participants SET \
                track             = COALESCE(?1, track), \
                start_weight      = COALESCE(?2, start_weight), \
                start_waist       = COALESCE(?3, start_waist), \
                height            = COALESCE(?4, height), \
                start_photo_front = COALESCE(?5, start_photo_front), \
                start_photo_left  = COALESCE(?6, start_photo_left), \
                start_photo_right = COALESCE(?7, start_photo_right), \
                start_photo_back  = COALESCE(?8, start_photo_back) \
             WHERE id = ?9",
            params![
                update.track.map(|t| t.as_str()),
                update.start_weight,
                update.start_waist,
                update.height,
                update.start_photo_front,
                update.start_photo_left,
                update.start_photo_right,
                update.start_photo_back,
                id,
            ],
        )?;
        Ok(())
    }

    /// `onboarding -> pending_payment`, stamping the completion time.
    /// Conditional so a concurrent timeout drop cannot be overwritten.
    pub fn complete_onboarding(&self, id: i64, now: DateTime<Utc>) -> Result<bool, DatabaseError> {
        let n = self.conn.execute(
            "UPDATE participants SET status = 'pending_payment', onboarding_completed_at = ?1 \
             WHERE id = ?2 AND status = 'onboarding'",
            params![ts(now), id],
        )?;
        Ok(n > 0)
    }

    /// Reset a dropped participant back to a clean onboarding row.
    pub fn restart_onboarding(&self, id: i64, now: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE participants SET \
                track = NULL, start_weight = NULL, start_waist = NULL, height = NULL, \
                start_photo_front = NULL, start_photo_left = NULL, \
                start_photo_right = NULL, start_photo_back = NULL, \
                total_checkins = 0, completed_checkins = 0, skipped_checkins = 0, \
                pending_checkin_window_id = NULL, pending_checkin_requested_at = NULL, \
                status = 'onboarding', joined_at = ?1, onboarding_completed_at = NULL \
             WHERE id = ?2",
            params![ts(now), id],
        )?;
        Ok(())
    }

    /// Bump the discipline counters and return the updated row.
    pub fn increment_checkins(
        &self,
        id: i64,
        completed: bool,
    ) -> Result<Option<Participant>, DatabaseError> {
        let sql = if completed {
            "UPDATE participants SET total_checkins = total_checkins + 1, \
             completed_checkins = completed_checkins + 1 WHERE id = ?1"
        } else {
            "UPDATE participants SET total_checkins = total_checkins + 1, \
             skipped_checkins = skipped_checkins + 1 WHERE id = ?1"
        };
        self.conn.execute(sql, params![id])?;
        self.find_participant(id)
    }

    /// Strictly-`onboarding` participants who joined before the cutoff.
    pub fn list_onboarding_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Participant>, DatabaseError> {
        let sql = format!(
            "SELECT {PARTICIPANT_COLS} FROM participants \
             WHERE status = 'onboarding' AND joined_at < ?1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![ts(cutoff)], row_to_participant)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn set_pending_checkin(
        &self,
        id: i64,
        handoff: Option<(i64, DateTime<Utc>)>,
    ) -> Result<(), DatabaseError> {
        let (window_id, at) = match handoff {
            Some((w, at)) => (Some(w), Some(ts(at))),
            None => (None, None),
        };
        self.conn.execute(
            "UPDATE participants SET pending_checkin_window_id = ?1, \
             pending_checkin_requested_at = ?2 WHERE id = ?3",
            params![window_id, at, id],
        )?;
        Ok(())
    }

    // === Goals ===

    pub fn create_goal(
        &self,
        participant_id: i64,
        target_weight: Option<f64>,
        target_waist: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<Goal, DatabaseError> {
        self.conn.execute(
            "INSERT INTO goals (participant_id, target_weight, target_waist, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![participant_id, target_weight, target_waist, ts(now)],
        )?;
        let id = self.conn.last_insert_rowid();
        let sql = format!("SELECT {GOAL_COLS} FROM goals WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt.query_row(params![id], row_to_goal)?)
    }

    pub fn find_goal_by_participant(
        &self,
        participant_id: i64,
    ) -> Result<Option<Goal>, DatabaseError> {
        let sql = format!("SELECT {GOAL_COLS} FROM goals WHERE participant_id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt
            .query_row(params![participant_id], row_to_goal)
            .optional()?)
    }

    pub fn update_goal_targets(
        &self,
        id: i64,
        target_weight: Option<f64>,
        target_waist: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE goals SET target_weight = COALESCE(?1, target_weight), \
             target_waist = COALESCE(?2, target_waist), updated_at = ?3 WHERE id = ?4",
            params![target_weight, target_waist, ts(now), id],
        )?;
        Ok(())
    }

    pub fn update_goal_validation(
        &self,
        id: i64,
        verdict: GoalVerdict,
        feedback: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE goals SET is_validated = 1, validation_result = ?1, \
             validation_feedback = ?2, validated_at = ?3 WHERE id = ?4",
            params![verdict.as_str(), feedback, ts(now), id],
        )?;
        Ok(())
    }

    pub fn delete_goal_by_participant(&self, participant_id: i64) -> Result<(), DatabaseError> {
        self.conn.execute(
            "DELETE FROM goals WHERE participant_id = ?1",
            params![participant_id],
        )?;
        Ok(())
    }

    // === Payments ===

    /// Idempotent payment-row creation; the unique index makes the
    /// second concurrent creator a no-op.
    pub fn get_or_create_payment(
        &self,
        participant_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Payment, DatabaseError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO payments (participant_id, status, created_at)
             VALUES (?1, 'pending', ?2)",
            params![participant_id, ts(now)],
        )?;
        self.find_payment_by_participant(participant_id)?
            .ok_or_else(|| DatabaseError::QueryFailed("payment insert lost".into()))
    }

    pub fn find_payment_by_participant(
        &self,
        participant_id: i64,
    ) -> Result<Option<Payment>, DatabaseError> {
        let sql = format!("SELECT {PAYMENT_COLS} FROM payments WHERE participant_id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt
            .query_row(params![participant_id], row_to_payment)
            .optional()?)
    }

    /// `pending -> marked_paid`.
    pub fn mark_payment_paid(
        &self,
        participant_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let n = self.conn.execute(
            "UPDATE payments SET status = 'marked_paid', marked_paid_at = ?1 \
             WHERE participant_id = ?2 AND status = 'pending'",
            params![ts(now), participant_id],
        )?;
        Ok(n > 0)
    }

    /// Atomically confirm the payment and flip the participant to
    /// `active`. A participant can only become active through this
    /// path, so both writes sit in one transaction.
    pub fn confirm_payment_and_activate(
        &self,
        participant_id: i64,
        confirmed_by: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let paid = tx.execute(
            "UPDATE payments SET status = 'confirmed', confirmed_at = ?1, confirmed_by = ?2 \
             WHERE participant_id = ?3 AND status = 'marked_paid'",
            params![ts(now), confirmed_by, participant_id],
        )?;
        if paid == 0 {
            // Race loser or wrong state; nothing to roll back.
            return Ok(false);
        }
        let flipped = tx.execute(
            "UPDATE participants SET status = 'active' \
             WHERE id = ?1 AND status = 'payment_marked'",
            params![participant_id],
        )?;
        if flipped == 0 {
            // Payment and participant status disagree; abandon both.
            tx.rollback()?;
            return Ok(false);
        }
        tx.commit()?;
        Ok(true)
    }

    // === Check-in windows ===

    pub fn create_window(
        &self,
        challenge_id: i64,
        window_number: i64,
        opens_at: DateTime<Utc>,
        closes_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO checkin_windows \
             (challenge_id, window_number, opens_at, closes_at, status, created_at)
             VALUES (?1, ?2, ?3, ?4, 'scheduled', ?5)",
            params![challenge_id, window_number, ts(opens_at), ts(closes_at), ts(now)],
        )?;
        Ok(())
    }

    pub fn find_window(&self, id: i64) -> Result<Option<CheckinWindow>, DatabaseError> {
        let sql = format!("SELECT {WINDOW_COLS} FROM checkin_windows WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt.query_row(params![id], row_to_window).optional()?)
    }

    pub fn list_windows(&self, challenge_id: i64) -> Result<Vec<CheckinWindow>, DatabaseError> {
        let sql = format!(
            "SELECT {WINDOW_COLS} FROM checkin_windows \
             WHERE challenge_id = ?1 ORDER BY window_number"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![challenge_id], row_to_window)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn find_open_window_for_challenge(
        &self,
        challenge_id: i64,
    ) -> Result<Option<CheckinWindow>, DatabaseError> {
        let sql = format!(
            "SELECT {WINDOW_COLS} FROM checkin_windows \
             WHERE challenge_id = ?1 AND status = 'open'"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt
            .query_row(params![challenge_id], row_to_window)
            .optional()?)
    }

    pub fn windows_due_to_open(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<CheckinWindow>, DatabaseError> {
        let sql = format!(
            "SELECT {WINDOW_COLS} FROM checkin_windows \
             WHERE status = 'scheduled' AND opens_at <= ?1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![ts(now)], row_to_window)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Open windows with no reminder yet whose close falls inside the
    /// lead time.
    pub fn windows_needing_reminder(
        &self,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<CheckinWindow>, DatabaseError> {
        let sql = format!(
            "SELECT {WINDOW_COLS} FROM checkin_windows \
             WHERE status = 'open' AND reminder_sent_at IS NULL AND closes_at <= ?1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![ts(threshold)], row_to_window)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn windows_due_to_close(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<CheckinWindow>, DatabaseError> {
        let sql = format!(
            "SELECT {WINDOW_COLS} FROM checkin_windows \
             WHERE status = 'open' AND closes_at <= ?1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![ts(now)], row_to_window)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// `scheduled -> open`; only one tick wins a given window.
    pub fn open_window_if_scheduled(&self, id: i64) -> Result<bool, DatabaseError> {
        let n = self.conn.execute(
            "UPDATE checkin_windows SET status = 'open' WHERE id = ?1 AND status = 'scheduled'",
            params![id],
        )?;
        Ok(n > 0)
    }

    /// `open -> closed`; the loser of the race must not re-apply skip
    /// accounting, so the caller keys off the returned bool.
    pub fn close_window_if_open(&self, id: i64) -> Result<bool, DatabaseError> {
        let n = self.conn.execute(
            "UPDATE checkin_windows SET status = 'closed' WHERE id = ?1 AND status = 'open'",
            params![id],
        )?;
        Ok(n > 0)
    }

    /// Stamp the reminder exactly once.
    pub fn mark_reminder_sent(&self, id: i64, now: DateTime<Utc>) -> Result<bool, DatabaseError> {
        let n = self.conn.execute(
            "UPDATE checkin_windows SET reminder_sent_at = ?1 \
             WHERE id = ?2 AND reminder_sent_at IS NULL",
            params![ts(now), id],
        )?;
        Ok(n > 0)
    }

    // === Checkins ===

    /// Insert-or-ignore keyed on (participant, window). Returns `true`
    /// when the row was actually inserted; a duplicate submission is a
    /// benign no-op reported as `false`.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_checkin(
        &self,
        participant_id: i64,
        window_id: i64,
        weight: f64,
        waist: f64,
        photos: [&str; 4],
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let n = self.conn.execute(
            "INSERT OR IGNORE INTO checkins \
             (participant_id, window_id, weight, waist, photo_front, photo_left, photo_right, \
              photo_back, submitted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                participant_id,
                window_id,
                weight,
                waist,
                photos[0],
                photos[1],
                photos[2],
                photos[3],
                ts(now),
            ],
        )?;
        Ok(n > 0)
    }

    pub fn find_checkin(
        &self,
        participant_id: i64,
        window_id: i64,
    ) -> Result<Option<Checkin>, DatabaseError> {
        let sql = format!(
            "SELECT {CHECKIN_COLS} FROM checkins WHERE participant_id = ?1 AND window_id = ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt
            .query_row(params![participant_id, window_id], row_to_checkin)
            .optional()?)
    }

    pub fn list_checkins_by_window(&self, window_id: i64) -> Result<Vec<Checkin>, DatabaseError> {
        let sql = format!("SELECT {CHECKIN_COLS} FROM checkins WHERE window_id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![window_id], row_to_checkin)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_checkins_by_participant(
        &self,
        participant_id: i64,
    ) -> Result<Vec<Checkin>, DatabaseError> {
        let sql = format!(
            "SELECT {CHECKIN_COLS} FROM checkins \
             WHERE participant_id = ?1 ORDER BY submitted_at"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![participant_id], row_to_checkin)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// The participant's most recent submission, used as the final
    /// measurement at scoring time.
    pub fn latest_checkin(&self, participant_id: i64) -> Result<Option<Checkin>, DatabaseError> {
        let sql = format!(
            "SELECT {CHECKIN_COLS} FROM checkins WHERE participant_id = ?1 \
             ORDER BY submitted_at DESC, id DESC LIMIT 1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt
            .query_row(params![participant_id], row_to_checkin)
            .optional()?)
    }

    // === Bank Holder elections ===

    /// One election per challenge; a second creation attempt reports
    /// `None` via the unique constraint.
    pub fn create_election(
        &self,
        challenge_id: i64,
        initiated_by: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<BankHolderElection>, DatabaseError> {
        let n = self.conn.execute(
            "INSERT OR IGNORE INTO bank_holder_elections \
             (challenge_id, initiated_by, status, created_at)
             VALUES (?1, ?2, 'in_progress', ?3)",
            params![challenge_id, initiated_by, ts(now)],
        )?;
        if n == 0 {
            return Ok(None);
        }
        self.find_election_by_challenge(challenge_id)
    }

    pub fn find_election(&self, id: i64) -> Result<Option<BankHolderElection>, DatabaseError> {
        let sql = format!("SELECT {ELECTION_COLS} FROM bank_holder_elections WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt.query_row(params![id], row_to_election).optional()?)
    }

    pub fn find_election_by_challenge(
        &self,
        challenge_id: i64,
    ) -> Result<Option<BankHolderElection>, DatabaseError> {
        let sql =
            format!("SELECT {ELECTION_COLS} FROM bank_holder_elections WHERE challenge_id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt
            .query_row(params![challenge_id], row_to_election)
            .optional()?)
    }

    pub fn list_elections_in_progress_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<BankHolderElection>, DatabaseError> {
        let sql = format!(
            "SELECT {ELECTION_COLS} FROM bank_holder_elections \
             WHERE status = 'in_progress' AND created_at < ?1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![ts(cutoff)], row_to_election)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// The finalization gate: `in_progress -> completed`. The first
    /// caller to flip proceeds with side effects; everyone else backs
    /// off.
    pub fn complete_election_if_in_progress(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let n = self.conn.execute(
            "UPDATE bank_holder_elections SET status = 'completed', completed_at = ?1 \
             WHERE id = ?2 AND status = 'in_progress'",
            params![ts(now), id],
        )?;
        Ok(n > 0)
    }

    /// `in_progress -> cancelled`, for challenges called off mid-vote.
    pub fn cancel_election_if_in_progress(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let n = self.conn.execute(
            "UPDATE bank_holder_elections SET status = 'cancelled', completed_at = ?1 \
             WHERE id = ?2 AND status = 'in_progress'",
            params![ts(now), id],
        )?;
        Ok(n > 0)
    }

    /// One vote per (election, voter); a duplicate is reported as
    /// `false`, never overwritten.
    pub fn insert_vote(
        &self,
        election_id: i64,
        voter_id: i64,
        voted_for_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let n = self.conn.execute(
            "INSERT OR IGNORE INTO bank_holder_votes (election_id, voter_id, voted_for_id, voted_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![election_id, voter_id, voted_for_id, ts(now)],
        )?;
        Ok(n > 0)
    }

    pub fn find_vote(
        &self,
        election_id: i64,
        voter_id: i64,
    ) -> Result<Option<BankHolderVote>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, election_id, voter_id, voted_for_id, voted_at FROM bank_holder_votes \
             WHERE election_id = ?1 AND voter_id = ?2",
        )?;
        Ok(stmt
            .query_row(params![election_id, voter_id], row_to_vote)
            .optional()?)
    }

    pub fn list_votes(&self, election_id: i64) -> Result<Vec<BankHolderVote>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, election_id, voter_id, voted_for_id, voted_at FROM bank_holder_votes \
             WHERE election_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![election_id], row_to_vote)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // === Commitments ===

    pub fn list_active_templates(&self) -> Result<Vec<CommitmentTemplate>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, category, is_active FROM commitment_templates \
             WHERE is_active = 1 ORDER BY id",
        )?;
        let rows = stmt.query_map([], row_to_template)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Replace the participant's selection wholesale.
    pub fn set_participant_commitments(
        &self,
        participant_id: i64,
        template_ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM participant_commitments WHERE participant_id = ?1",
            params![participant_id],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO participant_commitments (participant_id, template_id, created_at)
                 VALUES (?1, ?2, ?3)",
            )?;
            for template_id in template_ids {
                stmt.execute(params![participant_id, template_id, ts(now)])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_participant_commitments(
        &self,
        participant_id: i64,
    ) -> Result<Vec<CommitmentTemplate>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name, t.description, t.category, t.is_active \
             FROM participant_commitments pc \
             JOIN commitment_templates t ON t.id = pc.template_id \
             WHERE pc.participant_id = ?1 ORDER BY t.id",
        )?;
        let rows = stmt.query_map(params![participant_id], row_to_template)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn delete_participant_commitments(
        &self,
        participant_id: i64,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "DELETE FROM participant_commitments WHERE participant_id = ?1",
            params![participant_id],
        )?;
        Ok(())
    }

    // === Check-in recommendations ===

    #[allow(clippy::too_many_arguments)]
    pub fn insert_recommendation(
        &self,
        checkin_id: i64,
        participant_id: i64,
        advice: &crate::oracle::CheckinAdvice,
        model: &str,
        processing_time_ms: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let warning_flags = if advice.warning_flags.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&advice.warning_flags).unwrap_or_default())
        };
        self.conn.execute(
            "INSERT INTO checkin_recommendations \
             (checkin_id, participant_id, progress_assessment, body_composition_notes, \
              nutrition_advice, training_advice, motivational_message, warning_flags, model, \
              processing_time_ms, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                checkin_id,
                participant_id,
                advice.progress_assessment,
                advice.body_composition_notes,
                advice.nutrition_advice,
                advice.training_advice,
                advice.motivational_message,
                warning_flags,
                model,
                processing_time_ms,
                ts(now),
            ],
        )?;
        Ok(())
    }

    // === Admin ===

    /// Hard reset. The only path that deletes live data; explicit
    /// admin action only.
    pub fn reset_all(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "DELETE FROM checkin_recommendations;
             DELETE FROM participant_commitments;
             DELETE FROM bank_holder_votes;
             DELETE FROM bank_holder_elections;
             DELETE FROM checkins;
             DELETE FROM checkin_windows;
             DELETE FROM payments;
             DELETE FROM goals;
             DELETE FROM participants;
             DELETE FROM challenges;",
        )?;
        Ok(())
    }
}
