//! Class, section and subject seeding.

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::models::{SEED_CODE_PREFIX, SUBJECTS, SeedConfig, SeededClass, section_name};

/// Creates `Grade 1..=N` for the configured academic year with their sections.
///
/// Existing classes and sections with the same names are reused.
pub async fn seed_classes(
    tx: &mut Transaction<'_, Postgres>,
    config: &SeedConfig,
) -> anyhow::Result<Vec<SeededClass>> {
    let capacity = i32::try_from(config.students_per_section.max(30)).unwrap_or(i32::MAX);
    let mut classes = Vec::with_capacity(config.classes);

    for grade in 1..=config.classes {
        let class_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO classes (name, academic_year) VALUES ($1, $2)
             ON CONFLICT (name, academic_year) DO UPDATE SET updated_at = NOW()
             RETURNING id",
        )
        .bind(format!("Grade {}", grade))
        .bind(&config.academic_year)
        .fetch_one(&mut **tx)
        .await?;

        let mut section_ids = Vec::with_capacity(config.sections_per_class);
        for idx in 0..config.sections_per_class {
            let section_id = sqlx::query_scalar::<_, Uuid>(
                "INSERT INTO sections (class_id, name, capacity) VALUES ($1, $2, $3)
                 ON CONFLICT (class_id, name) DO UPDATE SET updated_at = NOW()
                 RETURNING id",
            )
            .bind(class_id)
            .bind(section_name(idx))
            .bind(capacity)
            .fetch_one(&mut **tx)
            .await?;
            section_ids.push(section_id);
        }

        classes.push(SeededClass {
            id: class_id,
            grade,
            section_ids,
        });
    }

    Ok(classes)
}

/// Adds the standard subject list to every class, handing subjects and
/// class-teacher duties to teachers round-robin.
pub async fn seed_subjects(
    tx: &mut Transaction<'_, Postgres>,
    classes: &[SeededClass],
    teacher_user_ids: &[Uuid],
    tag: &str,
) -> anyhow::Result<usize> {
    let mut next_teacher = teacher_user_ids.iter().cycle();
    let mut created = 0;

    for class in classes {
        if let Some(class_teacher) = next_teacher.next() {
            sqlx::query("UPDATE classes SET class_teacher_id = $1, updated_at = NOW() WHERE id = $2")
                .bind(class_teacher)
                .bind(class.id)
                .execute(&mut **tx)
                .await?;
        }

        for (name, abbrev) in SUBJECTS {
            sqlx::query(
                "INSERT INTO subjects (name, code, class_id, teacher_id) VALUES ($1, $2, $3, $4)",
            )
            .bind(*name)
            .bind(format!("{}{}-{}{}", SEED_CODE_PREFIX, tag, abbrev, class.grade))
            .bind(class.id)
            .bind(next_teacher.next().copied())
            .execute(&mut **tx)
            .await?;
            created += 1;
        }
    }

    Ok(created)
}
