//! Общие типы данных для сервиса синхронизации каталога mflow.

pub mod domain;
pub mod usecases;
