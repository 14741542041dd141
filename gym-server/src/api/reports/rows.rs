//! CSV rows per export type

use shared::models::{Attendance, Class, Gym, Member, TokenTransaction};

use crate::utils::csv::{CsvRecord, opt, timestamp};

impl CsvRecord for Member {
    fn headers() -> &'static [&'static str] {
        &[
            "Member Code",
            "Name",
            "Email",
            "Phone",
            "Token Balance",
            "Status",
            "Check-ins",
            "Last Check-in",
            "Joined",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.member_code.clone(),
            self.name.clone(),
            self.email.clone(),
            opt(&self.phone),
            self.token_balance.to_string(),
            status(self.is_active),
            self.check_in_count.to_string(),
            self.last_check_in.map(timestamp).unwrap_or_default(),
            timestamp(self.created_at),
        ]
    }
}

impl CsvRecord for Gym {
    fn headers() -> &'static [&'static str] {
        &["ID", "Name", "Email", "Phone", "City", "State", "Country", "Status", "Created"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.email.clone(),
            opt(&self.phone),
            opt(&self.address.city),
            opt(&self.address.state),
            opt(&self.address.country),
            status(self.is_active),
            timestamp(self.created_at),
        ]
    }
}

impl CsvRecord for Attendance {
    fn headers() -> &'static [&'static str] {
        &[
            "ID",
            "Member ID",
            "Member",
            "Class",
            "Check-in",
            "Check-out",
            "Duration (min)",
            "Tokens Used",
            "Status",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.member_id.to_string(),
            opt(&self.member_name),
            opt(&self.class_name),
            timestamp(self.check_in),
            self.check_out.map(timestamp).unwrap_or_default(),
            opt(&self.duration_minutes()),
            self.token_used.to_string(),
            format!("{:?}", self.status).to_lowercase(),
        ]
    }
}

impl CsvRecord for Class {
    fn headers() -> &'static [&'static str] {
        &[
            "ID",
            "Name",
            "Trainer",
            "Gym ID",
            "Day",
            "Start",
            "End",
            "Capacity",
            "Enrolled",
            "Token Cost",
            "Status",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            opt(&self.trainer),
            opt(&self.gym_id),
            self.day.as_str().to_string(),
            self.start_time.clone(),
            self.end_time().unwrap_or_default(),
            self.max_capacity.to_string(),
            self.current_enrollment.to_string(),
            self.token_cost.to_string(),
            status(self.is_active),
        ]
    }
}

impl CsvRecord for TokenTransaction {
    fn headers() -> &'static [&'static str] {
        &[
            "ID",
            "Member ID",
            "Type",
            "Amount",
            "Description",
            "Reference",
            "Related",
            "Created By",
            "Date",
        ]
    }

    fn fields(&self) -> Vec<String> {
        let related = match self.related_document {
            Some(doc) => match doc.id() {
                Some(id) => format!("{}:{id}", doc.kind()),
                None => doc.kind().to_string(),
            },
            None => String::new(),
        };
        vec![
            self.id.to_string(),
            self.member_id.to_string(),
            self.tx_type.as_str().to_string(),
            self.amount.to_string(),
            self.description.clone(),
            self.reference.clone(),
            related,
            opt(&self.created_by),
            timestamp(self.created_at),
        ]
    }
}

fn status(is_active: bool) -> String {
    if is_active { "active" } else { "inactive" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::csv::encode;
    use shared::models::{RelatedDocument, TransactionType};

    #[test]
    fn test_transaction_row() {
        let tx = TokenTransaction {
            id: 3,
            member_id: 1,
            tx_type: TransactionType::Debit,
            amount: 3,
            description: "Check-in: Yoga, level 1".into(),
            reference: "CHECKIN-9".into(),
            related_document: Some(RelatedDocument::Attendance { id: 9 }),
            created_by: None,
            created_at: 0,
        };
        let csv = encode(&[tx]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ID,Member ID,Type,Amount,Description,Reference,Related,Created By,Date"
        );
        assert_eq!(
            lines.next().unwrap(),
            "3,1,debit,3,\"Check-in: Yoga, level 1\",CHECKIN-9,attendance:9,,1970-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_empty_export_is_header_only() {
        let csv = encode::<Member>(&[]);
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("Member Code,Name,Email"));
    }
}
