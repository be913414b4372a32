use chrono::{DateTime, Utc};

use super::model::DocumentType;
use crate::order::model::{Order, OrderAddon, OrderDetails, OrderItem};

/// Branding printed in document headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompanyInfo {
    pub name: &'static str,
    pub address: &'static str,
    pub city_line: &'static str,
    pub phone: &'static str,
    pub email: &'static str,
    pub website: &'static str,
}

pub const DEFAULT_COMPANY_INFO: CompanyInfo = CompanyInfo {
    name: "Wholesale Flower Supply",
    address: "1200 Market Street",
    city_line: "Portland, OR 97205",
    phone: "(503) 555-0142",
    email: "orders@wholesaleflowersupply.com",
    website: "www.wholesaleflowersupply.com",
};

/// Input to a layout: the order with its lines plus render-time context.
#[derive(Debug, Clone)]
pub struct DocumentTemplateData {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub addons: Vec<OrderAddon>,
    pub generated_at: DateTime<Utc>,
    pub document_type: DocumentType,
    pub company: CompanyInfo,
}

impl DocumentTemplateData {
    pub fn addon_names(&self) -> impl Iterator<Item = &str> {
        self.addons.iter().filter_map(|a| a.addon_name.as_deref())
    }
}

pub fn prepare_template_data(details: &OrderDetails, document_type: DocumentType) -> DocumentTemplateData {
    DocumentTemplateData {
        order: details.order.clone(),
        items: details.items.clone(),
        addons: details.addons.clone(),
        generated_at: Utc::now(),
        document_type,
        company: DEFAULT_COMPANY_INFO,
    }
}
