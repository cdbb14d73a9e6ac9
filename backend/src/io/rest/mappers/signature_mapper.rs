use shared::{
    CraMonthResponse, NotificationReport, NotificationStatus, ResendNotificationResponse, SignatureStatus,
    SignerRole, SlotStatus, SubmitSignatureResponse,
};

use crate::domain::commands::signature::{ResendNotificationResult, SubmitSignatureResult};
use crate::domain::commands::work_schedule::CraMonth;
use crate::domain::models::signature::{LastNotification, SignatureKey, SignatureRecord};
use crate::io::rest::mappers::WorkScheduleMapper;

pub struct SignatureMapper;

impl SignatureMapper {
    /// Status of a key, with all slots empty when no record exists yet
    pub fn to_status(key: SignatureKey, record: Option<&SignatureRecord>) -> SignatureStatus {
        let slots = SignerRole::ALL
            .iter()
            .map(|role| {
                let slot = record.and_then(|r| r.slot(*role));
                SlotStatus {
                    role: *role,
                    signed: slot.is_some(),
                    signed_at: slot.map(|s| s.signed_at.clone()),
                    signer_id: slot.map(|s| s.signer_id),
                }
            })
            .collect();

        SignatureStatus {
            consultant_id: key.consultant_id,
            month: key.month,
            year: key.year,
            slots,
            fully_signed: record.map(SignatureRecord::is_fully_signed).unwrap_or(false),
            completed_at: record.and_then(|r| r.completed_at.clone()),
            last_notification: record
                .and_then(|r| r.last_notification.clone())
                .map(Self::notification_to_dto),
            last_notified_at: record.and_then(|r| r.last_notification.as_ref().map(|n| n.at.clone())),
        }
    }

    pub fn notification_to_dto(notification: LastNotification) -> NotificationReport {
        NotificationReport {
            status: notification.status,
            recipients: notification.recipients,
            detail: notification.detail,
        }
    }

    pub fn to_submit_response(result: SubmitSignatureResult) -> SubmitSignatureResponse {
        let fully_signed = result.record.is_fully_signed();
        let signature = Self::to_status(result.record.key, Some(&result.record));
        let (notification, message) = match result.notification {
            None => (
                NotificationReport {
                    status: NotificationStatus::NotTriggered,
                    recipients: Vec::new(),
                    detail: None,
                },
                "Signature recorded".to_string(),
            ),
            Some(n) if n.status == NotificationStatus::Sent => (
                Self::notification_to_dto(n),
                "Signature recorded; all parties have signed and the CRA was emailed".to_string(),
            ),
            Some(n) => (
                Self::notification_to_dto(n),
                "Signature recorded; all parties have signed but the email could not be sent, an administrator can resend it"
                    .to_string(),
            ),
        };

        SubmitSignatureResponse {
            signature,
            fully_signed,
            notification,
            message,
        }
    }

    pub fn to_resend_response(result: ResendNotificationResult) -> ResendNotificationResponse {
        let message = match result.notification.status {
            NotificationStatus::Sent => "Signed CRA emailed again".to_string(),
            _ => "Signed CRA could not be sent".to_string(),
        };
        ResendNotificationResponse {
            signature: Self::to_status(result.record.key, Some(&result.record)),
            notification: Self::notification_to_dto(result.notification),
            message,
        }
    }

    pub fn to_cra_month_response(cra: CraMonth) -> CraMonthResponse {
        let key = SignatureKey::new(cra.summary.consultant_id, cra.summary.month, cra.summary.year);
        CraMonthResponse {
            signature: Self::to_status(key, cra.record.as_ref()),
            summary: WorkScheduleMapper::summary_to_dto(cra.summary, cra.month_label),
        }
    }
}
