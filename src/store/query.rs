// src/store/query.rs

//! SQL statements used by the store modules. Upserts use
//! `ON CONFLICT ... DO UPDATE` so re-running ingestion converges instead of
//! duplicating rows.

/// Merge a user by id, overwriting the login.
pub const UPSERT_USER: &str = r#"
    INSERT INTO users (id, login) VALUES (?, ?)
    ON CONFLICT(id) DO UPDATE SET login = excluded.login
"#;

pub const UPSERT_REPOSITORY: &str = r#"
    INSERT INTO repositories (id, name, full_name, owner_id) VALUES (?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        full_name = excluded.full_name,
        owner_id = excluded.owner_id
"#;

pub const GET_REPOSITORY_BY_FULL_NAME: &str = r#"
    SELECT id, name, full_name, owner_id FROM repositories WHERE full_name = ?
"#;

/// Merge a pull request by its source id; scalar fields overwrite on re-fetch.
pub const UPSERT_PULL: &str = r#"
    INSERT INTO pulls (
        id, number, title, body, user_id, created_at, closed_at,
        assignee_id, repository_id, author_association, merged, additions, deletions
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        number = excluded.number,
        title = excluded.title,
        body = excluded.body,
        user_id = excluded.user_id,
        created_at = excluded.created_at,
        closed_at = excluded.closed_at,
        assignee_id = excluded.assignee_id,
        repository_id = excluded.repository_id,
        author_association = excluded.author_association,
        merged = excluded.merged,
        additions = excluded.additions,
        deletions = excluded.deletions
"#;

pub const INSERT_PULL_ASSIGNEE: &str = r#"
    INSERT INTO pull_assignees (pull_id, user_id) VALUES (?, ?)
    ON CONFLICT(pull_id, user_id) DO NOTHING
"#;

pub const UPSERT_REVIEW: &str = r#"
    INSERT INTO reviews (id, pull_id, user_id, body, state, author_association, submitted_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        pull_id = excluded.pull_id,
        user_id = excluded.user_id,
        body = excluded.body,
        state = excluded.state,
        author_association = excluded.author_association,
        submitted_at = excluded.submitted_at
"#;

pub const GET_PULL: &str = r#"
    SELECT id, number, title, body, user_id, created_at, closed_at,
           assignee_id, repository_id, author_association, merged, additions, deletions
    FROM pulls WHERE id = ?
"#;

/// Adjust the file lifecycle bounds atomically: `first_merged` only ever moves
/// earlier, `last_deleted` only ever moves later, whatever the arrival order.
pub const UPSERT_FILE_BOUNDS: &str = r#"
    INSERT INTO files (filename, repository_id, first_merged, last_deleted)
    VALUES (?, ?, ?, ?)
    ON CONFLICT(filename, repository_id) DO UPDATE SET
        first_merged = CASE
            WHEN excluded.first_merged IS NULL THEN files.first_merged
            WHEN files.first_merged IS NULL THEN excluded.first_merged
            WHEN excluded.first_merged < files.first_merged THEN excluded.first_merged
            ELSE files.first_merged
        END,
        last_deleted = CASE
            WHEN excluded.last_deleted IS NULL THEN files.last_deleted
            WHEN files.last_deleted IS NULL THEN excluded.last_deleted
            WHEN excluded.last_deleted > files.last_deleted THEN excluded.last_deleted
            ELSE files.last_deleted
        END
"#;

pub const GET_FILE: &str = r#"
    SELECT filename, repository_id, first_merged, last_deleted
    FROM files WHERE filename = ? AND repository_id = ?
"#;

/// The natural key includes the pull id, so replays of the same pull
/// leave the row untouched.
pub const INSERT_FILE_CHANGE: &str = r#"
    INSERT INTO file_changes (filename, repository_id, pull_id, additions, deletions, changes)
    VALUES (?, ?, ?, ?, ?, ?)
    ON CONFLICT(filename, repository_id, pull_id) DO NOTHING
"#;

pub const UPSERT_BUG_ISSUE: &str = r#"
    INSERT INTO bug_issues (id, number, repository_id) VALUES (?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        number = excluded.number,
        repository_id = excluded.repository_id
"#;

pub const UPSERT_COMMIT_METRICS: &str = r#"
    INSERT INTO commits (
        id, buggy, project, lines_added, lines_deleted, files_touched, dirs_touched,
        subsystems_touched, entropy, developers, age, unique_changes,
        author_experience, author_recent_experience, author_subsystem_experience
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        buggy = excluded.buggy,
        project = excluded.project,
        lines_added = excluded.lines_added,
        lines_deleted = excluded.lines_deleted,
        files_touched = excluded.files_touched,
        dirs_touched = excluded.dirs_touched,
        subsystems_touched = excluded.subsystems_touched,
        entropy = excluded.entropy,
        developers = excluded.developers,
        age = excluded.age,
        unique_changes = excluded.unique_changes,
        author_experience = excluded.author_experience,
        author_recent_experience = excluded.author_recent_experience,
        author_subsystem_experience = excluded.author_subsystem_experience
"#;

/// The universe every detector filters from: merged pulls of the repository
/// with a non-empty diff.
pub const CONSIDERED_PULLS: &str = r#"
    SELECT id, number, title, body, user_id, created_at, closed_at,
           assignee_id, repository_id, author_association, merged, additions, deletions
    FROM pulls
    WHERE repository_id = ? AND merged = 1 AND (additions > 0 OR deletions > 0)
    ORDER BY id
"#;

/// Pulls that received at least one review from someone other than the author.
pub const NON_AUTHOR_REVIEWED_IDS: &str = r#"
    SELECT DISTINCT p.id
    FROM pulls p
    JOIN reviews r ON r.pull_id = p.id
    WHERE p.repository_id = ? AND r.user_id IS NOT NULL AND p.user_id IS NOT NULL
      AND r.user_id <> p.user_id
"#;

/// (pull id, reviewer id) for every review in the repository.
pub const REVIEW_PAIRS: &str = r#"
    SELECT r.pull_id, r.user_id
    FROM pulls p
    JOIN reviews r ON r.pull_id = p.id
    WHERE p.repository_id = ?
"#;

/// (author, reviewer) pairs where one reviewer accounts for more than half of
/// an author's received reviews, over a minimum of received reviews.
/// Self-reviews are excluded from both the counts and the pairs.
pub const REVIEW_BUDDY_PAIRS: &str = r#"
    SELECT p.user_id AS author_id, r.user_id AS reviewer_id
    FROM pulls p
    JOIN reviews r ON r.pull_id = p.id
    JOIN (
        SELECT p2.user_id AS author_id, COUNT(*) AS total_reviews
        FROM pulls p2
        JOIN reviews r2 ON r2.pull_id = p2.id
        WHERE p2.repository_id = ?1 AND p2.user_id <> r2.user_id
        GROUP BY p2.user_id
    ) totals ON totals.author_id = p.user_id
    WHERE p.repository_id = ?1 AND p.user_id <> r.user_id
    GROUP BY p.user_id, r.user_id, totals.total_reviews
    HAVING CAST(COUNT(*) AS REAL) / totals.total_reviews > 0.5
       AND totals.total_reviews > ?2
"#;

/// Pulls where some (author, reviewer) combination iterated more than the
/// given number of rounds.
pub const PING_PONG_PULL_IDS: &str = r#"
    SELECT DISTINCT pull_id FROM (
        SELECT r.pull_id AS pull_id, COUNT(*) AS rounds
        FROM pulls p
        JOIN reviews r ON r.pull_id = p.id
        WHERE p.repository_id = ?1
        GROUP BY r.pull_id, r.user_id
    ) WHERE rounds > ?2
"#;

pub const FILENAMES_FOR_PULL: &str = r#"
    SELECT filename FROM file_changes WHERE pull_id = ?
"#;

/// Pull ids of the changes that touched the file after the given instant,
/// nearest first. LIMIT bounds the forward walk.
pub const NEXT_CHANGED_PULL_IDS: &str = r#"
    SELECT p.id
    FROM file_changes fc
    JOIN pulls p ON fc.pull_id = p.id
    WHERE p.repository_id = ? AND fc.filename = ? AND p.closed_at > ?
    ORDER BY p.closed_at
    LIMIT ?
"#;

pub const BUG_ISSUE_IDS: &str = r#"
    SELECT id FROM bug_issues WHERE repository_id = ?
"#;

pub const BUG_ISSUE_NUMBERS: &str = r#"
    SELECT number FROM bug_issues WHERE repository_id = ?
"#;
