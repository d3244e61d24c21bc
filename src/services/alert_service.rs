// src/services/alert_service.rs

use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Paginated},
    db::AlertRepository,
    models::alert::{Alert, AlertListQuery, AlertStatus, AlertView},
    services::scope::Scope,
};

#[derive(Clone)]
pub struct AlertService {
    alert_repo: AlertRepository,
}

impl AlertService {
    pub fn new(alert_repo: AlertRepository) -> Self {
        Self { alert_repo }
    }

    pub async fn list(&self, scope: &Scope, query: &AlertListQuery) -> Result<Paginated<AlertView>, AppError> {
        let window = query.window();
        let (alerts, total) = self.alert_repo.list_page(&scope.staff_ids, query, window).await?;
        Ok(Paginated::new(alerts, total, window).map(AlertView::from))
    }

    async fn find_visible(&self, scope: &Scope, id: Uuid) -> Result<Alert, AppError> {
        self.alert_repo
            .find_by_id(id)
            .await?
            .filter(|a| scope.can_see_staff(a.staff_id))
            .ok_or_else(|| AppError::not_found("Alert"))
    }

    pub async fn get(&self, scope: &Scope, id: Uuid) -> Result<AlertView, AppError> {
        Ok(self.find_visible(scope, id).await?.into())
    }

    /// Takes the alert out of the active set; the next sweep may raise it again if the
    /// condition still holds.
    pub async fn dismiss(&self, scope: &Scope, id: Uuid) -> Result<AlertView, AppError> {
        let alert = self.find_visible(scope, id).await?;
        if alert.status == AlertStatus::Dismissed {
            return Ok(alert.into());
        }
        Ok(self.alert_repo.dismiss(id).await?.into())
    }
}
