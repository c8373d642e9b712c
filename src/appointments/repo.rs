use crate::appointments::repo_types::Appointment;
use crate::error::StoreError;
use sqlx::{Executor, Sqlite, SqlitePool};
use time::{Date, OffsetDateTime, Time};

impl Appointment {
    /// Insert an appointment. Overlapping slots are allowed.
    pub async fn create<'e, E>(
        db: E,
        doctor_id: i64,
        patient_name: &str,
        date: Date,
        time: Time,
    ) -> Result<Appointment, StoreError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (doctor_id, patient_name, date, time, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, doctor_id, patient_name, date, time, created_at
            "#,
        )
        .bind(doctor_id)
        .bind(patient_name)
        .bind(date)
        .bind(time)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await
        .map_err(StoreError::from_insert)?;
        Ok(row)
    }

    /// All appointments of one doctor, earliest date first.
    pub async fn list_by_doctor(
        db: &SqlitePool,
        doctor_id: i64,
    ) -> Result<Vec<Appointment>, StoreError> {
        let rows = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT id, doctor_id, patient_name, date, time, created_at
            FROM appointments
            WHERE doctor_id = ?
            ORDER BY date ASC, time ASC, id ASC
            "#,
        )
        .bind(doctor_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::{Role, User};
    use crate::db;
    use time::macros::{date, time};

    #[tokio::test]
    async fn create_round_trips_slot_and_sets_created_at() {
        let db = db::in_memory().await;
        let doc = User::create(&db, "doc", "doc@clinic.test", "h", Role::Doctor)
            .await
            .unwrap();

        let before = OffsetDateTime::now_utc() - time::Duration::seconds(1);
        let appt = Appointment::create(&db, doc.id, "pat", date!(2024 - 03 - 10), time!(14:30))
            .await
            .expect("insert");
        assert_eq!(appt.doctor_id, doc.id);
        assert_eq!(appt.patient_name, "pat");
        assert_eq!(appt.date, date!(2024 - 03 - 10));
        assert_eq!(appt.time, time!(14:30));
        assert!(appt.created_at >= before);
    }

    #[tokio::test]
    async fn same_slot_can_be_booked_twice() {
        let db = db::in_memory().await;
        let doc = User::create(&db, "doc", "doc@clinic.test", "h", Role::Doctor)
            .await
            .unwrap();
        for name in ["a", "b"] {
            Appointment::create(&db, doc.id, name, date!(2024 - 03 - 10), time!(9:00))
                .await
                .expect("insert");
        }
        let list = Appointment::list_by_doctor(&db, doc.id).await.unwrap();
        assert_eq!(list.len(), 2);
    }

    #[tokio::test]
    async fn list_by_doctor_filters_and_sorts_by_date() {
        let db = db::in_memory().await;
        let x = User::create(&db, "x", "x@clinic.test", "h", Role::Doctor).await.unwrap();
        let y = User::create(&db, "y", "y@clinic.test", "h", Role::Doctor).await.unwrap();

        Appointment::create(&db, x.id, "late", date!(2024 - 12 - 01), time!(8:00)).await.unwrap();
        Appointment::create(&db, y.id, "other", date!(2024 - 01 - 01), time!(8:00)).await.unwrap();
        Appointment::create(&db, x.id, "early", date!(2024 - 02 - 15), time!(16:00)).await.unwrap();
        Appointment::create(&db, x.id, "middle", date!(2024 - 06 - 30), time!(10:00)).await.unwrap();

        let list = Appointment::list_by_doctor(&db, x.id).await.unwrap();
        let names: Vec<_> = list.iter().map(|a| a.patient_name.as_str()).collect();
        assert_eq!(names, ["early", "middle", "late"]);
        assert!(list.iter().all(|a| a.doctor_id == x.id));
    }
}
