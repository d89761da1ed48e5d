//! User seeding: teachers, students and parents with their profile rows.

use campusly_models::users::UserRole;
use fake::Fake;
use fake::faker::name::en::*;
use rayon::prelude::*;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::models::{SEED_CODE_PREFIX, SEED_EMAIL_DOMAIN, SeededClass, StudentSeed, UserSeed};
use super::values_clause;

const BATCH_SIZE: usize = 500;

fn email_part(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase()
}

fn seed_user(
    role: UserRole,
    last_name: Option<&str>,
    index: usize,
    tag: &str,
    password_hash: &str,
) -> UserSeed {
    let first_name: String = FirstName().fake();
    let last_name = last_name.map_or_else(|| LastName().fake(), str::to_string);

    let email = format!(
        "{}.{}+{}{}.{}@{}",
        email_part(&first_name),
        email_part(&last_name),
        role.as_str(),
        index,
        tag,
        SEED_EMAIL_DOMAIN
    );

    UserSeed {
        first_name,
        last_name,
        email,
        password_hash: password_hash.to_string(),
        role,
    }
}

pub fn generate_teachers(count: usize, tag: &str, password_hash: &str) -> Vec<UserSeed> {
    (0..count)
        .into_par_iter()
        .map(|i| seed_user(UserRole::Teacher, None, i, tag, password_hash))
        .collect()
}

/// Generates students section by section, so the output is grouped in
/// runs of `per_section`.
pub fn generate_students(
    classes: &[SeededClass],
    per_section: usize,
    tag: &str,
    password_hash: &str,
) -> Vec<StudentSeed> {
    let today = chrono::Utc::now().date_naive();
    let slots: Vec<(&SeededClass, Uuid)> = classes
        .iter()
        .flat_map(|class| class.section_ids.iter().map(move |&s| (class, s)))
        .collect();

    slots
        .par_iter()
        .enumerate()
        .flat_map(|(slot_idx, &(class, section_id))| {
            (0..per_section)
                .map(|i| {
                    let index = slot_idx * 1000 + i;
                    // Pupils in grade N are roughly N + 5 years old.
                    let age_days = 365 * (class.grade as u64 + 5) + (i as u64 * 17) % 300;
                    StudentSeed {
                        user: seed_user(UserRole::Student, None, index, tag, password_hash),
                        admission_number: format!("{}{}-{:05}", SEED_CODE_PREFIX, tag, index),
                        class_id: class.id,
                        section_id,
                        gender: if i % 2 == 0 { "female" } else { "male" },
                        date_of_birth: today
                            .checked_sub_days(chrono::Days::new(age_days))
                            .unwrap_or(today),
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// One guardian per sibling pair, sharing the first child's surname.
pub fn generate_parents(
    students: &[StudentSeed],
    per_section: usize,
    tag: &str,
    password_hash: &str,
) -> Vec<(UserSeed, Vec<usize>)> {
    let pairs: Vec<Vec<usize>> = (0..students.len())
        .collect::<Vec<_>>()
        .chunks(per_section.max(1))
        .flat_map(|section| section.chunks(2).map(<[usize]>::to_vec).collect::<Vec<_>>())
        .collect();

    pairs
        .into_par_iter()
        .enumerate()
        .map(|(i, children)| {
            let surname = students[children[0]].user.last_name.as_str();
            let parent = seed_user(UserRole::Parent, Some(surname), i, tag, password_hash);
            (parent, children)
        })
        .collect()
}

/// Inserts user rows in multi-value batches and returns their ids in input order.
pub async fn insert_users(
    tx: &mut Transaction<'_, Postgres>,
    users: &[&UserSeed],
) -> anyhow::Result<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(users.len());

    for chunk in users.chunks(BATCH_SIZE) {
        let query = format!(
            "INSERT INTO users (first_name, last_name, email, password_hash, role, is_verified) \
             VALUES {} RETURNING id",
            values_clause(chunk.len(), 6)
        );

        let mut q = sqlx::query_scalar::<_, Uuid>(&query);
        for user in chunk {
            q = q
                .bind(&user.first_name)
                .bind(&user.last_name)
                .bind(&user.email)
                .bind(&user.password_hash)
                .bind(user.role.as_str())
                .bind(true);
        }

        ids.extend(q.fetch_all(&mut **tx).await?);
    }

    Ok(ids)
}

pub async fn insert_teacher_profiles(
    tx: &mut Transaction<'_, Postgres>,
    user_ids: &[Uuid],
    tag: &str,
) -> anyhow::Result<()> {
    for (chunk_idx, chunk) in user_ids.chunks(BATCH_SIZE).enumerate() {
        let query = format!(
            "INSERT INTO teachers (user_id, employee_number, hire_date) VALUES {}",
            values_clause(chunk.len(), 3)
        );

        let mut q = sqlx::query(&query);
        for (i, user_id) in chunk.iter().enumerate() {
            q = q
                .bind(user_id)
                .bind(format!(
                    "{}{}-T{:04}",
                    SEED_CODE_PREFIX,
                    tag,
                    chunk_idx * BATCH_SIZE + i
                ))
                .bind(chrono::Utc::now().date_naive());
        }

        q.execute(&mut **tx).await?;
    }

    Ok(())
}

/// Inserts student profiles and returns the student ids in input order.
pub async fn insert_student_profiles(
    tx: &mut Transaction<'_, Postgres>,
    students: &[StudentSeed],
    user_ids: &[Uuid],
) -> anyhow::Result<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(students.len());

    for (chunk, users) in students.chunks(BATCH_SIZE).zip(user_ids.chunks(BATCH_SIZE)) {
        let query = format!(
            "INSERT INTO students \
             (user_id, admission_number, class_id, section_id, gender, date_of_birth) \
             VALUES {} RETURNING id",
            values_clause(chunk.len(), 6)
        );

        let mut q = sqlx::query_scalar::<_, Uuid>(&query);
        for (student, user_id) in chunk.iter().zip(users) {
            q = q
                .bind(user_id)
                .bind(&student.admission_number)
                .bind(student.class_id)
                .bind(student.section_id)
                .bind(student.gender)
                .bind(student.date_of_birth);
        }

        ids.extend(q.fetch_all(&mut **tx).await?);
    }

    Ok(ids)
}

/// Creates parent profiles and links each to its children.
pub async fn insert_parent_profiles(
    tx: &mut Transaction<'_, Postgres>,
    user_ids: &[Uuid],
    children: &[Vec<usize>],
    student_ids: &[Uuid],
) -> anyhow::Result<()> {
    let mut parent_ids = Vec::with_capacity(user_ids.len());
    for chunk in user_ids.chunks(BATCH_SIZE) {
        let query = format!(
            "INSERT INTO parents (user_id) VALUES {} RETURNING id",
            values_clause(chunk.len(), 1)
        );
        let mut q = sqlx::query_scalar::<_, Uuid>(&query);
        for user_id in chunk {
            q = q.bind(user_id);
        }
        parent_ids.extend(q.fetch_all(&mut **tx).await?);
    }

    let links: Vec<(Uuid, Uuid)> = parent_ids
        .iter()
        .zip(children)
        .flat_map(|(&parent_id, kids)| kids.iter().map(move |&k| (parent_id, student_ids[k])))
        .collect();

    for chunk in links.chunks(BATCH_SIZE) {
        let query = format!(
            "INSERT INTO parent_students (parent_id, student_id, relationship) VALUES {}",
            values_clause(chunk.len(), 3)
        );
        let mut q = sqlx::query(&query);
        for (parent_id, student_id) in chunk {
            q = q.bind(parent_id).bind(student_id).bind("guardian");
        }
        q.execute(&mut **tx).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> Vec<SeededClass> {
        vec![
            SeededClass {
                id: Uuid::new_v4(),
                grade: 1,
                section_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
            },
            SeededClass {
                id: Uuid::new_v4(),
                grade: 2,
                section_ids: vec![Uuid::new_v4()],
            },
        ]
    }

    #[test]
    fn test_generate_teachers() {
        let teachers = generate_teachers(4, "abc123", "hash");
        assert_eq!(teachers.len(), 4);
        for t in &teachers {
            assert_eq!(t.role, UserRole::Teacher);
            assert!(t.email.ends_with(".abc123@example.com"));
            assert_eq!(t.password_hash, "hash");
        }
    }

    #[test]
    fn test_students_are_grouped_by_section() {
        let classes = classes();
        let students = generate_students(&classes, 3, "abc123", "hash");
        assert_eq!(students.len(), 9);
        assert!(students[..3].iter().all(|s| s.section_id == classes[0].section_ids[0]));
        assert!(students[3..6].iter().all(|s| s.section_id == classes[0].section_ids[1]));
        assert!(students[6..].iter().all(|s| s.class_id == classes[1].id));

        let mut numbers: Vec<_> = students.iter().map(|s| &s.admission_number).collect();
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), 9);
    }

    #[test]
    fn test_students_are_born_in_the_past() {
        let students = generate_students(&classes(), 2, "abc123", "hash");
        let today = chrono::Utc::now().date_naive();
        assert!(students.iter().all(|s| s.date_of_birth < today));
    }

    #[test]
    fn test_parents_pair_siblings_within_a_section() {
        let classes = classes();
        let students = generate_students(&classes, 3, "abc123", "hash");
        let parents = generate_parents(&students, 3, "abc123", "hash");

        // Three sections of three: each gives a pair and a single.
        assert_eq!(parents.len(), 6);
        assert_eq!(parents[0].1, vec![0, 1]);
        assert_eq!(parents[1].1, vec![2]);
        assert_eq!(parents[2].1, vec![3, 4]);
        assert_eq!(parents[0].0.last_name, students[0].user.last_name);
        assert!(parents.iter().all(|(p, _)| p.role == UserRole::Parent));
    }

    #[test]
    fn test_email_part_strips_punctuation() {
        assert_eq!(email_part("O'Conner"), "oconner");
        assert_eq!(email_part("Mary Jo"), "maryjo");
    }
}
