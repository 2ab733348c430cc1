pub mod medical_service;
