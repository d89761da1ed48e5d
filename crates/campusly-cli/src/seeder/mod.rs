//! Fake data seeding for local development and demos.
//!
//! A run creates classes and sections, teachers with subjects, students placed
//! in sections and a guardian for each sibling pair, all inside one
//! transaction. Seeded accounts use `@example.com` addresses and seeded codes
//! start with `SEED-`, which is what [`clear_all`] matches on.

pub mod academics;
pub mod models;
pub mod users;

use std::time::Instant;

use campusly_core::hash_password;
use rayon::prelude::*;
use sqlx::PgPool;
use uuid::Uuid;

pub use models::{SeedConfig, SeedPasswords};

use models::{SEED_CODE_PREFIX, SEED_EMAIL_DOMAIN, UserSeed};

/// Rows created by a seeding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub classes: usize,
    pub sections: usize,
    pub subjects: usize,
    pub teachers: usize,
    pub students: usize,
    pub parents: usize,
}

/// Rows removed by [`clear_all`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClearSummary {
    pub users: u64,
    pub classes: u64,
    pub subjects: u64,
}

/// Builds `($1, $2), ($3, $4), ...` for a multi-row INSERT.
pub(crate) fn values_clause(rows: usize, columns: usize) -> String {
    (0..rows)
        .map(|row| {
            let params: Vec<String> = (1..=columns)
                .map(|col| format!("${}", row * columns + col))
                .collect();
            format!("({})", params.join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

struct SeedHashes {
    teacher: String,
    student: String,
    parent: String,
}

/// Hashes the three role passwords in parallel.
fn hash_passwords(passwords: &SeedPasswords) -> anyhow::Result<SeedHashes> {
    let hashes = [&passwords.teacher, &passwords.student, &passwords.parent]
        .par_iter()
        .map(|p| hash_password(p).map_err(|e| anyhow::anyhow!(e.message())))
        .collect::<anyhow::Result<Vec<String>>>()?;

    match <[String; 3]>::try_from(hashes) {
        Ok([teacher, student, parent]) => Ok(SeedHashes {
            teacher,
            student,
            parent,
        }),
        Err(_) => anyhow::bail!("Password hashing returned an unexpected number of hashes"),
    }
}

/// Seeds a full school: classes, sections, subjects, teachers, students and parents.
pub async fn seed_all(db: &PgPool, config: &SeedConfig) -> anyhow::Result<SeedSummary> {
    let start_time = Instant::now();
    let tag: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();

    println!("🔑 Hashing seed passwords...");
    let hashes = hash_passwords(&config.passwords)?;

    let mut tx = db.begin().await?;

    println!(
        "🏫 Seeding {} classes with {} sections each ({})...",
        config.classes, config.sections_per_class, config.academic_year
    );
    let classes = academics::seed_classes(&mut tx, config).await?;

    println!("👩‍🏫 Seeding {} teachers...", config.teachers);
    let teachers = users::generate_teachers(config.teachers, &tag, &hashes.teacher);
    let teacher_ids = users::insert_users(&mut tx, &teachers.iter().collect::<Vec<_>>()).await?;
    users::insert_teacher_profiles(&mut tx, &teacher_ids, &tag).await?;

    println!("📚 Assigning subjects...");
    let subjects = academics::seed_subjects(&mut tx, &classes, &teacher_ids, &tag).await?;

    println!("🎓 Seeding {} students...", config.total_students());
    let students = users::generate_students(
        &classes,
        config.students_per_section,
        &tag,
        &hashes.student,
    );
    let student_users: Vec<&UserSeed> = students.iter().map(|s| &s.user).collect();
    let student_user_ids = users::insert_users(&mut tx, &student_users).await?;
    let student_ids =
        users::insert_student_profiles(&mut tx, &students, &student_user_ids).await?;

    println!("👪 Seeding {} parents...", config.total_parents());
    let parents = users::generate_parents(
        &students,
        config.students_per_section,
        &tag,
        &hashes.parent,
    );
    let parent_users: Vec<&UserSeed> = parents.iter().map(|(p, _)| p).collect();
    let children: Vec<Vec<usize>> = parents.iter().map(|(_, c)| c.clone()).collect();
    let parent_user_ids = users::insert_users(&mut tx, &parent_users).await?;
    users::insert_parent_profiles(&mut tx, &parent_user_ids, &children, &student_ids).await?;

    tx.commit().await?;

    let summary = SeedSummary {
        classes: classes.len(),
        sections: classes.iter().map(|c| c.section_ids.len()).sum(),
        subjects,
        teachers: teacher_ids.len(),
        students: student_ids.len(),
        parents: parent_user_ids.len(),
    };

    println!("\n✅ Seeding finished in {:?}", start_time.elapsed());
    println!("   {:?}", summary);
    println!(
        "   Passwords: teacher `{}`, student `{}`, parent `{}`",
        config.passwords.teacher, config.passwords.student, config.passwords.parent
    );

    Ok(summary)
}

/// Removes seeded accounts and the seeded classes left without students.
///
/// Admin accounts are kept even on the seed domain.
pub async fn clear_all(db: &PgPool) -> anyhow::Result<ClearSummary> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let email_pattern = format!("%@{}", SEED_EMAIL_DOMAIN);
    let code_pattern = format!("{}%", SEED_CODE_PREFIX);

    let mut tx = db.begin().await?;

    let users = sqlx::query("DELETE FROM users WHERE email LIKE $1 AND role <> 'admin'")
        .bind(&email_pattern)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let classes = sqlx::query(
        "DELETE FROM classes c
         WHERE EXISTS (SELECT 1 FROM subjects s WHERE s.class_id = c.id AND s.code LIKE $1)
           AND NOT EXISTS (SELECT 1 FROM students st WHERE st.class_id = c.id)",
    )
    .bind(&code_pattern)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let subjects = sqlx::query("DELETE FROM subjects WHERE code LIKE $1")
        .bind(&code_pattern)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    let summary = ClearSummary {
        users,
        classes,
        subjects,
    };
    println!(
        "   ✓ Deleted {} users, {} classes and {} leftover subjects in {:?}",
        summary.users,
        summary.classes,
        summary.subjects,
        start_time.elapsed()
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_clause() {
        assert_eq!(values_clause(1, 1), "($1)");
        assert_eq!(values_clause(2, 3), "($1, $2, $3), ($4, $5, $6)");
        assert_eq!(values_clause(0, 3), "");
    }

    #[test]
    fn test_hash_passwords_per_role() {
        let passwords = SeedPasswords::default();
        let hashes = hash_passwords(&passwords).unwrap();
        assert!(campusly_core::verify_password(&passwords.teacher, &hashes.teacher).unwrap());
        assert!(campusly_core::verify_password(&passwords.student, &hashes.student).unwrap());
        assert!(campusly_core::verify_password(&passwords.parent, &hashes.parent).unwrap());
        assert!(!campusly_core::verify_password(&passwords.parent, &hashes.teacher).unwrap());
    }
}
