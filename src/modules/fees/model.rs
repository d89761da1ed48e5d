pub use campusly_models::fees::{
    CreateInvoiceDto, Invoice, InvoiceFilterParams, InvoiceStatus, InvoiceView, Payment,
    PaymentReceipt, RecordPaymentDto,
};
