mod service_sas;
