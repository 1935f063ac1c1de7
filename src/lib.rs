/*!
# Review Insights

A small web application that collects review files and presents sentiment,
sales, revenue and visitor charts as a dashboard and as a PDF report.

## Overview

Users sign up and log in against an in-memory account store, upload a review
file (PDF or Excel), and are taken to a dashboard. All figures come from two
hardcoded demo datasets, so every chart and report is identical from one
request to the next.

## Architecture

### Web Layer
- **Technologies**: Rust, axum, handlebars
- **Key Components**:
  - Router and request logging middleware (`app`)
  - Page templates compiled into the binary (`templates`)
  - One-shot flash messages carried in a cookie (`flash`)

### Core
- **Account Store** - username to user record, behind the `AccountStore` trait
- **Upload Handler** - extension check, then the bytes go to the upload directory
- **Chart Generator** - four fixed charts rendered with plotters into PNG buffers
- **Dashboard Renderer** - base64 chart payloads inlined into the dashboard page
- **Report Builder** - a five page PDF: title page plus one page per chart

### Storage
- Accounts live in process memory and are lost on restart
- Uploaded files and the latest `report.pdf` live in the upload directory

## Modules

- **app**: Routing, shared state and server startup
- **config**: Environment configuration
- **data**: The hardcoded demo datasets
- **dashboard**: Dashboard rendering
- **downloader**: PDF report building and download
- **error**: Error types and HTTP mapping
- **flash**: Flash message cookies
- **graph**: Chart generation
- **login**: Accounts, sign-up and login
- **templates**: Handlebars registry
- **upload**: File upload validation and storage

## HTTP Endpoints

- `/` - Landing page
- `/sign_up`, `/login`, `/logout` - Account forms
- `/upload` - Upload form and file acceptance
- `/dashboard` - Four embedded charts
- `/download_report` - Generated PDF as an attachment
- `/settings`, `/chat`, `/report` - Informational pages
*/

pub mod app;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod downloader;
pub mod error;
pub mod flash;
pub mod graph;
pub mod login;
pub mod templates;
pub mod upload;

pub use app::{AppState, router, run};
pub use config::Config;
pub use error::{AppError, Result, ValidationError};
pub use login::{AccountStore, MemoryAccountStore, User};
