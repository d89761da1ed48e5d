pub use campusly_models::library::{
    Book, BookFilterParams, CreateBookDto, CreateLoanDto, LOAN_SELECT, Loan, LoanFilterParams,
    UpdateBookDto, overdue_fine,
};
